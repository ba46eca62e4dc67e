use leaf_database::{
    Database,
    impls::tags::{get_tag, get_tag_by_id, list_tags, search_tags},
    model::tags::Tag,
};

use crate::cli::{TagArgs, TagsArgs};

const SEARCH_LIMIT: u32 = 15;

pub async fn list(db: &Database, args: TagsArgs) -> anyhow::Result<()> {
    let tags = match args.search.as_deref() {
        Some(query) => search_tags(db, args.guild_id, query, SEARCH_LIMIT).await?,
        None => list_tags(db, args.guild_id, args.owner).await?,
    };

    if tags.is_empty() {
        println!("No tags found.");
        return Ok(());
    }

    for tag in &tags {
        let alias_marker = if tag.is_alias() { " (alias)" } else { "" };
        println!(
            "{}{} owner={} uses={}",
            tag.name, alias_marker, tag.owner_id, tag.uses
        );
    }

    Ok(())
}

pub async fn show(db: &Database, args: TagArgs) -> anyhow::Result<()> {
    let Some(tag) = get_tag(db, args.guild_id, &args.name).await? else {
        println!("That tag does not exist.");
        return Ok(());
    };

    let original = match tag.original_tag_id {
        Some(original_id) => get_tag_by_id(db, original_id).await?,
        None => None,
    };

    print!("{}", describe_tag(&tag, original.as_ref()));
    Ok(())
}

fn describe_tag(tag: &Tag, original: Option<&Tag>) -> String {
    let mut out = format!("Tag \"{}\" (id {})\n", tag.name, tag.id);
    out.push_str(&format!("Owner: {}\n", tag.owner_id));
    out.push_str(&format!(
        "Created: {}\n",
        tag.created_at.format("%Y-%m-%d %H:%M UTC")
    ));
    if tag.was_edited() {
        out.push_str(&format!(
            "Updated: {}\n",
            tag.last_edited_at.format("%Y-%m-%d %H:%M UTC")
        ));
    }
    out.push_str(&format!("Uses: {}\n", tag.uses));
    if let Some(original) = original {
        out.push_str(&format!("Alias of: {} (id {})\n", original.name, original.id));
    }
    out.push('\n');
    out.push_str(&tag.content);
    out.push('\n');
    out
}
