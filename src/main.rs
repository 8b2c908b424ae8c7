use std::{error::Error, path::PathBuf};

use chrono::NaiveTime;
use clap::{Parser, Subcommand};
use eframe::{egui::ViewportBuilder, run_native};
use wheel_alarm::{
    alarm::{AlarmId, AlarmRecord, AlarmTime, RepeatDays, SavedSound, WEEKDAYS},
    config::Config,
    sounds,
    storage::{AlarmStore, KeyValueStore, SoundLibrary},
    Clock,
};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// use this config file instead of the default one
    #[clap(long, short)]
    config: Option<PathBuf>,
    #[clap(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// write the default config
    Init {
        #[clap(long, short)]
        force: bool,
    },
    /// copy a sound file into the sounds directory and save it under a name
    NewSound { name: String, path: PathBuf },
    /// add an enabled alarm, it is scheduled the next time the clock runs
    NewAlarm {
        /// 24 hour `HH:MM`
        time: String,
        sound: PathBuf,
        /// day numbers to repeat on, 0 = Sunday
        #[clap(long, short, value_parser = clap::value_parser!(u8).range(0..7))]
        repeat: Vec<u8>,
    },
    /// print all alarms
    List,
    /// enable or disable an alarm
    Toggle { id: String },
    /// delete an alarm, its sound file is kept
    Delete { id: String },
}

fn storage(config: &Config) -> Result<KeyValueStore, Box<dyn Error>> {
    Ok(KeyValueStore::new(config.data_path()?))
}

fn print_alarms(alarms: &[AlarmRecord], time_format: &str) {
    for alarm in alarms {
        println!(
            "{}\t{}\t{}\t{}\t{}",
            alarm.id,
            alarm.time.format(time_format).trim(),
            if alarm.enabled { "on" } else { "off" },
            alarm.repeat_days,
            alarm.sound.display()
        );
    }
}

// TODO: make sure alarm ring is audible even when the system volume is low or muted
fn main() -> Result<(), Box<dyn Error>> {
    // initilize the logger
    if let Err(e) = simple_file_logger::init_logger!("wheel_alarm") {
        eprintln!("couldn't initialize logger: {e:?}");
    }

    let args = Args::parse();
    let config_path = match args.config {
        Some(path) => path,
        None => Config::config_path()?,
    };
    let config = Config::load_or_default(&config_path)?;

    match args.command {
        Some(Command::Init { force }) => {
            if force || !config_path.exists() {
                Config::new().save(&config_path)?;
                std::fs::create_dir_all(config.sounds_path()?)?;
                println!("wrote {}", config_path.display());
            } else {
                println!("{} already exists, use --force", config_path.display());
            }
            return Ok(());
        }
        Some(Command::NewSound { name, path }) => {
            let uri = sounds::import_upload(&path, &config.sounds_path()?)?;
            SoundLibrary::new(storage(&config)?).add(SavedSound { name, uri })?;
            return Ok(());
        }
        Some(Command::NewAlarm {
            time,
            sound,
            repeat,
        }) => {
            let time = AlarmTime::from(NaiveTime::parse_from_str(&time, "%H:%M")?);
            let sound = sounds::import_upload(&sound, &config.sounds_path()?)?;
            let repeat_days: RepeatDays = repeat
                .iter()
                .map(|day| WEEKDAYS[usize::from(*day)])
                .collect();
            let alarm = AlarmRecord::new(time, sound, repeat_days);
            let id = alarm.id.clone();
            AlarmStore::new(storage(&config)?).add(alarm)?;
            println!("added alarm {id}");
            return Ok(());
        }
        Some(Command::List) => {
            let alarms = AlarmStore::new(storage(&config)?).list()?;
            print_alarms(&alarms, &config.time_format);
            return Ok(());
        }
        Some(Command::Toggle { id }) => {
            let alarms = AlarmStore::new(storage(&config)?).toggle(&AlarmId::from(id))?;
            print_alarms(&alarms, &config.time_format);
            return Ok(());
        }
        Some(Command::Delete { id }) => {
            let alarms = AlarmStore::new(storage(&config)?).delete(&AlarmId::from(id))?;
            print_alarms(&alarms, &config.time_format);
            return Ok(());
        }
        None => {}
    }

    let native_options = eframe::NativeOptions {
        viewport: ViewportBuilder::default()
            .with_title("Wheel Alarm")
            .with_inner_size([420.0, 640.0]),
        ..Default::default()
    };
    let clock = Clock::new(config, Some(config_path))?;
    // run the gui
    run_native(
        "Wheel Alarm",
        native_options,
        Box::new(|_| Ok(Box::new(clock))),
    )
    .map_err(|e| e.into())
}
