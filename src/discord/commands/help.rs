use crate::discord::{Context, Error};
use poise::serenity_prelude as serenity;
use std::collections::HashMap;

// Category definitions with emojis and order
const CATEGORY_ORDER: &[&str] = &["Realm Status", "Utilities"];

fn get_category_emoji(category: &str) -> &'static str {
    match category {
        "Realm Status" => "🔥",
        "Utilities" => "🧰",
        _ => "•",
    }
}

struct CommandMetadata {
    category: &'static str,
    priority: i32,
    description: Option<&'static str>,
    note: Option<&'static str>,
}

fn get_command_metadata(name: &str) -> CommandMetadata {
    match name {
        "realm" => CommandMetadata {
            category: "Realm Status",
            priority: 100,
            description: Some("Show the last realm status the poller saw."),
            note: Some("Status updates are also posted to the status channel every minute."),
        },
        "uptime" => CommandMetadata {
            category: "Utilities",
            priority: 50,
            description: Some("How long the bot has been watching the realm."),
            note: Some("10 second cooldown per user."),
        },
        _ => CommandMetadata {
            category: "Utilities",
            priority: 0,
            description: None,
            note: None,
        },
    }
}

/// Show a categorized list of commands.
#[poise::command(slash_command, prefix_command)]
pub async fn help(ctx: Context<'_>) -> Result<(), Error> {
    let mut categories: HashMap<&str, Vec<(i32, String)>> = HashMap::new();

    for command in &ctx.framework().options().commands {
        if command.hide_in_help || command.name == "help" {
            continue;
        }

        let metadata = get_command_metadata(&command.name);
        let description = metadata
            .description
            .or(command.description.as_deref())
            .or(command.help_text.as_deref())
            .unwrap_or("No description provided.");

        categories
            .entry(metadata.category)
            .or_default()
            .push((metadata.priority, format_entry(&command.name, description, metadata.note)));
    }

    let mut embed = serenity::CreateEmbed::new()
        .title("Realm Watch Commands")
        .description("Use slash commands with `/`, or mention the bot followed by the command name.")
        .color(serenity::Colour::from_rgb(88, 101, 242))
        .timestamp(serenity::Timestamp::now());

    for category in sorted_categories(categories.keys().cloned().collect()) {
        if let Some(entries) = categories.get_mut(category) {
            // Sort by priority (descending), then name (ascending)
            entries.sort_by(|a, b| b.0.cmp(&a.0).then(a.1.cmp(&b.1)));

            let title = format!("{} {}", get_category_emoji(category), category);
            let lines: Vec<String> = entries.iter().map(|(_, s)| s.clone()).collect();
            embed = embed.field(title, lines.join("\n"), false);
        }
    }

    ctx.send(poise::CreateReply::default().embed(embed)).await?;

    Ok(())
}

fn format_entry(name: &str, description: &str, note: Option<&str>) -> String {
    let mut entry = format!("• **/{}** - {}", name, description);
    if let Some(note) = note {
        entry.push_str(&format!("\n  ⤷ {}", note));
    }
    entry
}

/// Known categories first in their fixed order, then the rest alphabetically.
fn sorted_categories(mut categories: Vec<&str>) -> Vec<&str> {
    categories.sort_by(|a, b| {
        let pos_a = CATEGORY_ORDER.iter().position(|x| x == a).unwrap_or(usize::MAX);
        let pos_b = CATEGORY_ORDER.iter().position(|x| x == b).unwrap_or(usize::MAX);
        pos_a.cmp(&pos_b).then(a.cmp(b))
    });
    categories
}
