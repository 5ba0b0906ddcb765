use clap::Subcommand;
use mindful_core::{JsonFileStore, SettingsStore};

use crate::output::{print_json, CliResult};

#[derive(Subcommand)]
pub enum SettingsAction {
    /// Show current settings
    Show {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
    /// Turn a setting on or off
    Set {
        /// notificationSound, vibration or soundEnabled
        key: String,
        /// true or false
        #[arg(action = clap::ArgAction::Set)]
        value: bool,
    },
}

pub fn run(action: SettingsAction) -> CliResult {
    let mut store = SettingsStore::new(Box::new(JsonFileStore::open()?));
    match action {
        SettingsAction::Show { json } => {
            let settings = store.load();
            if json {
                return print_json(&settings);
            }
            println!("notificationSound: {}", settings.notification_sound);
            println!("vibration:         {}", settings.vibration);
            println!("soundEnabled:      {}", settings.sound_enabled);
        }
        SettingsAction::Set { key, value } => {
            let mut settings = store.load();
            settings.set(&key, value)?;
            store.save(&settings)?;
            println!("{key} = {value}");
        }
    }
    Ok(())
}
