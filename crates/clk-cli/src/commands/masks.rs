//! Mask settings: binding masks to roles.

use std::collections::BTreeMap;

use clk_core::reply::role_mention;
use clk_core::{Caller, Embed, MaskBinding, MaskName, Rejection, Reply};
use clk_db::Database;

use super::CommandResult;

/// Binds a new mask to `role_id`.
pub fn add(db: &Database, caller: &Caller, role_id: i64, mask: &str) -> CommandResult {
    let name = MaskName::new(mask)?;
    let binding = MaskBinding {
        guild_id: caller.guild_id,
        role_id,
        mask: name.into(),
    };
    if !db.insert_mask(&binding)? {
        return Err(Rejection::MaskExists {
            mask: binding.mask,
        }
        .into());
    }
    tracing::info!(guild_id = caller.guild_id, role_id, mask, "added mask");

    Ok(Reply::text(format!(
        "Added the mask `{mask}` to {}.",
        role_mention(role_id)
    )))
}

pub fn remove(db: &Database, caller: &Caller, mask: &str) -> CommandResult {
    let Some(role_id) = db.delete_mask(caller.guild_id, mask)? else {
        return Err(Rejection::MaskNotFound {
            mask: mask.to_string(),
        }
        .into());
    };
    tracing::info!(guild_id = caller.guild_id, role_id, mask, "removed mask");
    Ok(Reply::text(format!("Removed the mask `{mask}`.")))
}

/// Lists the guild's masks, one field per role.
pub fn list(db: &Database, caller: &Caller) -> CommandResult {
    let bindings = db.list_masks(caller.guild_id)?;
    if bindings.is_empty() {
        return Ok(Reply::text("There are no masks set up in this server."));
    }

    let mut by_role: BTreeMap<i64, Vec<String>> = BTreeMap::new();
    for binding in bindings {
        by_role.entry(binding.role_id).or_default().push(binding.mask);
    }

    let embed = by_role
        .into_iter()
        .fold(Embed::new().title("Masks"), |embed, (role_id, masks)| {
            let value = masks
                .iter()
                .map(|mask| format!("\u{2022} `{mask}`"))
                .collect::<Vec<_>>()
                .join("\n");
            embed.field(role_mention(role_id), value)
        });
    Ok(Reply::Embeds {
        embeds: vec![embed],
    })
}
