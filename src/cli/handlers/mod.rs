use std::io::IsTerminal;
use std::path::{Path, PathBuf};

use crate::cli::commands::*;
use crate::cli::output::*;
use crate::io::backend::FileBackend;
use crate::io::config_io;
use crate::model::config::Config;
use crate::ops::store::{Change, StoreError, TaskStore};

type CmdResult = Result<(), Box<dyn std::error::Error>>;

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

pub fn dispatch(cli: Cli) -> CmdResult {
    let json = cli.json;
    let data_dir = cli.data_dir.as_deref();

    match cli.command {
        // Config commands load the config file themselves
        Some(Commands::Config(cmd)) => cmd_config(cmd, data_dir, json),
        None => cmd_list(&Context::load(data_dir)?, ListArgs { search: None }, json),
        Some(Commands::Add(args)) => cmd_add(&Context::load(data_dir)?, args, json),
        Some(Commands::List(args)) => cmd_list(&Context::load(data_dir)?, args, json),
        Some(Commands::Toggle(args)) => cmd_toggle(&Context::load(data_dir)?, args, json),
        Some(Commands::Rm(args)) => cmd_rm(&Context::load(data_dir)?, args, json),
        Some(Commands::Categories) => cmd_categories(&Context::load(data_dir)?, json),
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Everything a command needs besides its own arguments
struct Context {
    config: Config,
    data_dir: PathBuf,
}

impl Context {
    fn load(data_dir_override: Option<&Path>) -> Result<Self, config_io::ConfigError> {
        let config = config_io::read_config()?;
        let data_dir = config_io::resolve_data_dir(data_dir_override, &config);
        log::debug!("data dir: {}", data_dir.display());
        Ok(Context { config, data_dir })
    }

    /// Open the task store for reading
    fn open_store(&self) -> TaskStore<FileBackend> {
        watch(TaskStore::open(FileBackend::new(&self.data_dir)))
    }

    /// Lock the data dir, then open the task store. The lock is held until
    /// the store is dropped, so the whole command is one exclusive update.
    fn open_store_for_write(&self) -> Result<TaskStore<FileBackend>, Box<dyn std::error::Error>> {
        let store = watch(TaskStore::open(FileBackend::locked(&self.data_dir)?));
        if !store.can_save() {
            return Err(format!(
                "saved tasks in {} could not be read; not changing them",
                self.data_dir.display()
            )
            .into());
        }
        Ok(store)
    }

    fn list_style(&self) -> ListStyle {
        ListStyle {
            max_title_width: self.config.ui.title_width(),
            color: self.config.ui.color
                && std::env::var_os("NO_COLOR").is_none()
                && std::io::stdout().is_terminal(),
        }
    }
}

/// Log each change the store reports
fn watch(mut store: TaskStore<FileBackend>) -> TaskStore<FileBackend> {
    store.subscribe(|change, tasks| match change {
        Change::Added(id) => log::info!("added {} ({} tasks)", id, tasks.len()),
        Change::Toggled(id) => log::info!("toggled {}", id),
        Change::Deleted(ids) => log::info!("deleted {} task(s)", ids.len()),
        Change::SearchChanged => {}
    });
    store
}

/// Turn 1-based listing positions into store positions
fn to_store_positions(positions: &[usize]) -> Result<Vec<usize>, String> {
    positions
        .iter()
        .map(|&p| {
            p.checked_sub(1)
                .ok_or_else(|| "positions start at 1".to_string())
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Task commands
// ---------------------------------------------------------------------------

fn cmd_add(ctx: &Context, args: AddArgs, json: bool) -> CmdResult {
    let title = args.title.join(" ");
    if title.trim().is_empty() {
        return Err("task title cannot be empty".into());
    }
    let priority = args.priority.unwrap_or(ctx.config.defaults.priority);
    let category = args
        .category
        .filter(|c| !c.trim().is_empty())
        .unwrap_or_else(|| ctx.config.defaults.category.clone());

    let mut store = ctx.open_store_for_write()?;
    let task = store.add_task(title, priority, category);
    let (id, line) = (task.id, format_task_line(task));

    if json {
        let added = AddedJson {
            id,
            position: store.len(),
        };
        println!("{}", serde_json::to_string_pretty(&added)?);
    } else {
        println!("Added {}", line);
    }
    Ok(())
}

fn cmd_list(ctx: &Context, args: ListArgs, json: bool) -> CmdResult {
    let mut store = ctx.open_store();
    store.set_search_text(args.search.unwrap_or_default());
    let visible = store.visible_tasks();

    if json {
        println!("{}", serde_json::to_string_pretty(&listing_to_json(&visible))?);
        return Ok(());
    }

    if visible.is_empty() {
        if store.is_empty() {
            println!("No tasks yet! Add one with `tm add <title>`.");
        } else {
            println!("No matching tasks.");
        }
        return Ok(());
    }
    for line in format_listing(&visible, ctx.list_style()) {
        println!("{}", line);
    }
    Ok(())
}

fn cmd_toggle(ctx: &Context, args: ToggleArgs, json: bool) -> CmdResult {
    let mut store = ctx.open_store_for_write()?;
    let id = store.find_by_prefix(&args.id)?.id;
    if !store.toggle_complete(id) {
        return Err(format!("task not found: {}", args.id).into());
    }
    let Some(task) = store.get(id) else {
        return Err(format!("task not found: {}", args.id).into());
    };

    if json {
        let toggled = ToggledJson {
            id,
            is_completed: task.is_completed,
        };
        println!("{}", serde_json::to_string_pretty(&toggled)?);
    } else {
        let verb = if task.is_completed { "Done" } else { "Reopened" };
        println!("{}: {}", verb, format_task_line(task));
    }
    Ok(())
}

fn cmd_rm(ctx: &Context, args: RmArgs, json: bool) -> CmdResult {
    let positions = to_store_positions(&args.positions)?;
    let mut store = ctx.open_store_for_write()?;
    let search = args.search.unwrap_or_default();
    let removed = store
        .delete_tasks(&positions, &search)
        .map_err(|e| -> Box<dyn std::error::Error> {
            match e {
                // Report positions the way `tm list` numbers them
                StoreError::InvalidPosition { position, len } => format!(
                    "invalid position {}: only {} task(s) listed",
                    position + 1,
                    len
                )
                .into(),
                other => other.into(),
            }
        })?;

    if json {
        let deleted = DeletedJson {
            deleted: removed.iter().map(|t| t.id).collect(),
        };
        println!("{}", serde_json::to_string_pretty(&deleted)?);
    } else {
        for task in &removed {
            println!("Deleted {}", format_task_line(task));
        }
    }
    Ok(())
}

fn cmd_categories(ctx: &Context, json: bool) -> CmdResult {
    let categories = &ctx.config.ui.categories;
    if json {
        println!("{}", serde_json::to_string_pretty(categories)?);
    } else {
        for category in categories {
            let marker = if *category == ctx.config.defaults.category {
                " (default)"
            } else {
                ""
            };
            println!("{}{}", category, marker);
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Config commands
// ---------------------------------------------------------------------------

fn cmd_config(cmd: ConfigCmd, data_dir_override: Option<&Path>, json: bool) -> CmdResult {
    let path = config_io::config_path();
    match cmd {
        ConfigCmd::Show => {
            let config = config_io::read_config_from(&path)?;
            let data_dir = config_io::resolve_data_dir(data_dir_override, &config);
            if json {
                let value = serde_json::json!({
                    "path": path,
                    "dataDir": data_dir,
                    "config": config,
                });
                println!("{}", serde_json::to_string_pretty(&value)?);
            } else {
                println!("# {}", path.display());
                println!("# data dir: {}", data_dir.display());
                print!("{}", toml::to_string_pretty(&config)?);
            }
        }
        ConfigCmd::Set(args) => {
            let mut doc = config_io::read_document(&path)?;
            config_io::set_value(&mut doc, &args.key, &args.value)?;
            config_io::write_document(&path, &doc)?;
            if json {
                let value = serde_json::json!({ "key": args.key, "value": args.value });
                println!("{}", serde_json::to_string_pretty(&value)?);
            } else {
                println!("{} = {}", args.key, args.value);
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn positions_shift_to_zero_based() {
        assert_eq!(to_store_positions(&[1, 3]).unwrap(), vec![0, 2]);
        assert!(to_store_positions(&[0]).is_err());
        assert!(to_store_positions(&[]).unwrap().is_empty());
    }
}
