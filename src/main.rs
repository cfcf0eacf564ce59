use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::io::{self, BufRead};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use closet_tracker::photo::loader::{self, BATCH_YIELD_EVERY};
use closet_tracker::share::{self, codec, file, ImportMode, StagedImport};
use closet_tracker::speed::{FolderCamera, SpeedAdd};
use closet_tracker::state::data::COLORS;
use closet_tracker::state::items::{ItemFilter, ItemPatch};
use closet_tracker::state::outfits::ResolvedOutfit;
use closet_tracker::state::prefs::Theme;
use closet_tracker::{Category, Closet, Color, Config, ImageRef, Item, Library};

/// Number of items shown when previewing an import
const IMPORT_PREVIEW: usize = 12;

/// Keep track of your closet from the terminal:
/// photos tagged by category and color, outfits, and share links
#[derive(Parser, Debug)]
#[command(name = "closet")]
#[command(about = "👕 Track your closet: photos, outfits, and share links")]
#[command(version)]
struct Cli {
    /// Directory holding the closet database
    #[arg(long, global = true, env = "CLOSET_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Page that share links point at
    #[arg(long, global = true, env = "CLOSET_SHARE_BASE")]
    share_base: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Add one item from a photo file or an image URL
    Add {
        #[arg(short, long, help = "Category, e.g. \"T-Shirt\" (defaults to the draft)")]
        category: Option<String>,
        #[arg(long, help = "Palette name or #RRGGBB")]
        color: Option<String>,
        #[arg(long, conflicts_with = "url", help = "Photo file to compress and embed")]
        photo: Option<PathBuf>,
        #[arg(long, help = "http(s) image URL")]
        url: Option<String>,
    },

    /// Add many photos at once with the same category and color
    Batch {
        #[arg(short, long)]
        category: String,
        #[arg(long)]
        color: Option<String>,
        /// Photo files or folders
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },

    /// List items, optionally filtered
    List {
        #[arg(short, long)]
        category: Option<String>,
        #[arg(long)]
        color: Option<String>,
    },

    /// Change an item's category, color or picture
    Edit {
        id: String,
        #[arg(short, long)]
        category: Option<String>,
        #[arg(long, conflicts_with = "no_color")]
        color: Option<String>,
        #[arg(long, help = "Remove the color")]
        no_color: bool,
        #[arg(long, conflicts_with = "url")]
        photo: Option<PathBuf>,
        #[arg(long)]
        url: Option<String>,
    },

    /// Delete an item (outfits using it keep their other items)
    Delete { id: String },

    /// Build and browse outfits
    #[command(subcommand)]
    Outfit(OutfitCommand),

    /// Print a link that carries the whole closet
    Share,

    /// Preview and apply a share link, token, or export file
    Import {
        /// Share link or bare token
        link: Option<String>,
        #[arg(long, conflicts_with = "link")]
        file: Option<PathBuf>,
        #[arg(long, conflicts_with = "merge", help = "Discard the current closet and adopt the import")]
        replace: bool,
        #[arg(long, help = "Add items whose id is new, keep everything else")]
        merge: bool,
    },

    /// Write the closet to a JSON file
    Export {
        #[arg(short, long, default_value = ".")]
        out: PathBuf,
    },

    /// Speed-Add: shoot many photos, then save them all at once
    Speed {
        /// Folder acting as the camera (one photo per shutter press)
        #[arg(long)]
        camera: PathBuf,
        #[arg(short, long)]
        category: Option<String>,
        #[arg(long)]
        color: Option<String>,
    },

    /// Show or set the theme
    Theme { theme: Option<Theme> },

    /// Inspect the saved add-form draft
    #[command(subcommand)]
    Draft(DraftCommand),

    /// List the fixed categories
    Categories,

    /// List the color palette
    Colors,
}

#[derive(Subcommand, Debug)]
enum OutfitCommand {
    /// Save an outfit from item ids
    Create {
        #[arg(short, long, default_value = "")]
        name: String,
        #[arg(required = true)]
        ids: Vec<String>,
    },
    /// Show outfits, newest first
    List,
    /// Delete an outfit
    Delete { id: String },
}

#[derive(Subcommand, Debug)]
enum DraftCommand {
    Show,
    /// Save category and/or picture for a later `add`
    Set {
        #[arg(short, long)]
        category: Option<String>,
        #[arg(long, conflicts_with = "url")]
        photo: Option<PathBuf>,
        #[arg(long)]
        url: Option<String>,
    },
    Clear,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr, results to stdout
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "closet_tracker=info,closet=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let cli = Cli::parse();

    let config = Config::resolve(cli.data_dir, cli.share_base)?;
    config.validate()?;

    let library = Library::open(config.db_path()).context("Failed to open the closet database")?;
    let mut closet = Closet::load(&library);
    info!(
        "Closet loaded from {} with {} items",
        library.path().display(),
        closet.items.len()
    );

    run(cli.command, &config, &mut closet).await
}

async fn run(command: Command, config: &Config, closet: &mut Closet<'_>) -> Result<()> {
    match command {
        Command::Add { category, color, photo, url } => {
            let image = picked_image(photo, url, config).await?;
            let category = category.as_deref().map(Category::parse);
            let color = parse_color(color.as_deref())?;
            let item = closet.add_item(category, color, image)?;
            println!("✅ Added {} ({})", item.caption(), item.id);
        }

        Command::Batch { category, color, paths } => {
            let category = Category::parse(&category);
            if category.is_blank() {
                bail!("Pick a category first, then select multiple photos to batch add.");
            }
            let color = parse_color(color.as_deref())?;

            let files = loader::collect_image_files(&paths);
            if files.is_empty() {
                bail!("No photos found");
            }
            let report = loader::normalize_batch(files, config.normalize, BATCH_YIELD_EVERY).await;
            for (path, e) in &report.failures {
                eprintln!("⚠️  Skipped {}: {}", path.display(), e);
            }
            if report.images.is_empty() {
                bail!("None of the {} files could be used", report.total());
            }

            let added = closet
                .items
                .add_batch(&category, color.as_ref(), report.data_urls())?;
            closet.prefs.set_last_category(&category)?;
            println!("✅ Imported {} items to {}.", added.len(), category);
        }

        Command::List { category, color } => {
            let filter = ItemFilter {
                category: category.as_deref().map(Category::parse),
                color_hex: parse_color(color.as_deref())?.map(|c| c.hex),
            };
            let items = closet.items.filter(&filter);
            if items.is_empty() {
                println!("No items yet.");
            }
            for item in items {
                print_item(item);
            }
        }

        Command::Edit { id, category, color, no_color, photo, url } => {
            let mut patch = ItemPatch::default();
            if let Some(category) = category {
                patch = patch.category(Category::parse(&category));
            }
            if no_color {
                patch = patch.color(None);
            } else if let Some(color) = parse_color(color.as_deref())? {
                patch = patch.color(Some(color));
            }
            if let Some(image) = picked_image(photo, url, config).await? {
                patch = patch.image(image);
            }
            if patch.is_empty() {
                bail!("Nothing to change");
            }

            let item = closet.items.update(&id, patch)?;
            println!("✅ Updated {} ({})", item.caption(), item.id);
        }

        Command::Delete { id } => {
            let removed = closet.items.remove(&id)?;
            println!("🗑️  Deleted {} ({})", removed.caption(), removed.id);
        }

        Command::Outfit(command) => run_outfit(command, closet)?,

        Command::Share => {
            let collection = closet.collection();
            if collection.items.is_empty() {
                bail!("Nothing to share yet");
            }
            let link = codec::share_link(&config.share_base_url, &collection, config.max_link_len)
                .context("Failed to create share link")?;
            println!("{link}");
        }

        Command::Import { link, file: path, replace, merge } => {
            let staged = match (&link, path) {
                (_, Some(path)) => file::read_import(&path)
                    .with_context(|| format!("Could not import {}", path.display()))?,
                (Some(link), None) => {
                    let token = codec::token_from_link(link)?;
                    share::decode(&token).context("Sorry, that import link is invalid or too large")?
                }
                (None, None) => bail!("Pass a share link, a token, or --file"),
            };
            print_staged(&staged);

            let mode = match (replace, merge) {
                (true, _) => ImportMode::Replace,
                (_, true) => ImportMode::Merge,
                _ => {
                    println!("Nothing applied. Re-run with --replace or --merge.");
                    return Ok(());
                }
            };
            let outcome = closet.apply_import(&staged, mode)?;
            let how = match mode {
                ImportMode::Replace => "replaced",
                ImportMode::Merge => "merged",
            };
            println!("✅ Imported ({how}): {} -> {} items", outcome.before, outcome.after);

            if let Some(clean) = link.as_deref().and_then(|l| codec::without_import_param(l).ok()) {
                info!("Import handled, address without token: {}", clean);
            }
        }

        Command::Export { out } => {
            let collection = closet.collection();
            let today = chrono::Local::now().date_naive();
            let path = file::write_export(&out, &collection, today)?;
            println!("✅ Exported {} items to {}", collection.items.len(), path.display());
        }

        Command::Speed { camera, category, color } => {
            let category = category
                .as_deref()
                .map(Category::parse)
                .or_else(|| closet.suggested_category());
            let color = parse_color(color.as_deref())?;
            run_speed(camera, category, color, config, closet).await?;
        }

        Command::Theme { theme } => match theme {
            Some(theme) => {
                closet.prefs.set_theme(theme)?;
                println!("Theme set to {theme}");
            }
            None => match closet.prefs.theme() {
                Some(theme) => println!("{theme}"),
                None => println!("{} (default)", Theme::default()),
            },
        },

        Command::Draft(DraftCommand::Show) => match closet.prefs.draft() {
            Some(draft) => {
                let thumb = match draft.image() {
                    Some(ImageRef::Data(data)) => format!("embedded photo ({} KB)", data.len() / 1024),
                    Some(ImageRef::Url(url)) => url,
                    None => "no picture".to_string(),
                };
                let category = if draft.category.is_empty() { "no category" } else { draft.category.as_str() };
                println!("📝 {category}, {thumb}");
            }
            None => println!("No draft."),
        },

        Command::Draft(DraftCommand::Set { category, photo, url }) => {
            let image = picked_image(photo, url, config).await?;
            let category = category.as_deref().map(Category::parse);
            if category.is_none() && image.is_none() {
                bail!("Nothing to save; pass --category, --photo or --url");
            }
            closet.update_draft(category.as_ref(), image.as_ref())?;
            println!("📝 Draft saved");
        }

        Command::Draft(DraftCommand::Clear) => {
            closet.prefs.clear_draft()?;
            println!("Draft cleared");
        }

        Command::Categories => {
            for category in Category::ALL.iter() {
                println!("{category}");
            }
        }

        Command::Colors => {
            for color in COLORS.iter() {
                println!("{:<10} {}", color.hex, color.name);
            }
        }
    }

    Ok(())
}

fn run_outfit(command: OutfitCommand, closet: &mut Closet<'_>) -> Result<()> {
    match command {
        OutfitCommand::Create { name, ids } => {
            if let Some(missing) = ids.iter().find(|id| closet.items.get(id).is_none()) {
                bail!("No item with id {missing}");
            }
            let outfit = closet.outfits.add(&name, ids)?;
            println!("✅ Outfit saved: {} ({})", outfit.title(), outfit.id);
        }
        OutfitCommand::List => {
            let outfits = closet.resolved_outfits();
            if outfits.is_empty() {
                println!("No outfits yet.");
            }
            for resolved in &outfits {
                print_outfit(resolved);
            }
        }
        OutfitCommand::Delete { id } => {
            let removed = closet.outfits.remove(&id)?;
            println!("🗑️  Deleted outfit {}", removed.title());
        }
    }
    Ok(())
}

/// Interactive capture loop over stdin
async fn run_speed(
    camera: PathBuf,
    mut category: Option<Category>,
    color: Option<Color>,
    config: &Config,
    closet: &mut Closet<'_>,
) -> Result<()> {
    let mut session = SpeedAdd::new(config.normalize);
    session.open(Box::new(FolderCamera::new(camera)))?;

    println!("📸 Speed-Add: [enter]/s = shutter, u = undo, g <paths> = add from gallery, c [category] = save, q = cancel");

    let stdin = io::stdin();
    for line in stdin.lock().lines() {
        let line = line?;
        let mut words = line.split_whitespace();
        match words.next().unwrap_or("s") {
            "s" => match session.shutter() {
                Ok(queued) => println!("📸 {queued} queued"),
                Err(e) => eprintln!("⚠️  {e}"),
            },
            "u" => {
                session.undo();
                println!("↩️  {} queued", session.len());
            }
            "g" => {
                let inputs: Vec<PathBuf> = words.map(PathBuf::from).collect();
                let report = session
                    .add_from_gallery(loader::collect_image_files(&inputs))
                    .await?;
                for (path, e) in &report.failures {
                    eprintln!("⚠️  Skipped {}: {}", path.display(), e);
                }
                println!(
                    "🖼️  Added {} photo{} from gallery, {} queued",
                    report.added,
                    if report.added == 1 { "" } else { "s" },
                    session.len()
                );
            }
            "c" => {
                let rest = words.collect::<Vec<_>>().join(" ");
                if !rest.is_empty() {
                    category = Some(Category::parse(&rest));
                }
                let Some(chosen) = category.clone() else {
                    eprintln!("⚠️  Choose a category first: c <category>");
                    continue;
                };
                match session.commit(&chosen, color.as_ref(), &mut closet.items) {
                    Ok(items) => {
                        closet.prefs.set_last_category(&chosen)?;
                        println!("✅ Saved {} items to {}.", items.len(), chosen);
                        return Ok(());
                    }
                    Err(e) => eprintln!("⚠️  {e}"),
                }
            }
            "q" => {
                session.discard();
                println!("Cancelled.");
                return Ok(());
            }
            other => eprintln!("Unknown command '{other}'"),
        }
    }

    // Input closed without saving
    session.discard();
    Ok(())
}

/// Turn `--photo`/`--url` into an image reference
async fn picked_image(photo: Option<PathBuf>, url: Option<String>, config: &Config) -> Result<Option<ImageRef>> {
    match (photo, url) {
        (Some(path), _) => {
            let image = loader::normalize_file(path.clone(), config.normalize)
                .await
                .with_context(|| format!("Could not use {}", path.display()))?;
            Ok(Some(ImageRef::Data(image.data_url)))
        }
        (None, Some(url)) => Ok(Some(ImageRef::Url(url.trim().to_string()))),
        (None, None) => Ok(None),
    }
}

fn parse_color(input: Option<&str>) -> Result<Option<Color>> {
    match input {
        None => Ok(None),
        Some(text) => match Color::parse(text) {
            Some(color) => Ok(Some(color)),
            None => bail!("Unknown color '{text}'; use a palette name or #RRGGBB"),
        },
    }
}

fn print_item(item: &Item) {
    let picture = match (&item.image_data_url, &item.image_url) {
        (Some(data), _) if !data.is_empty() => format!("photo {} KB", data.len() / 1024),
        (_, Some(url)) => url.clone(),
        _ => "no picture".to_string(),
    };
    println!(
        "{}  {:<18} {:<12} {}",
        item.id,
        item.category.as_str(),
        item.color_label().unwrap_or("-"),
        picture
    );
}

fn print_outfit(resolved: &ResolvedOutfit<'_>) {
    let outfit = resolved.outfit;
    let missing = outfit.item_ids.len() - resolved.item_count();
    println!("👗 {} ({})", outfit.title(), outfit.id);

    for (label, empty, items) in [
        ("Tops", "No tops", &resolved.tops),
        ("Bottoms", "No bottoms", &resolved.bottoms),
    ] {
        if items.is_empty() {
            println!("   {empty}");
        } else {
            let captions: Vec<String> = items.iter().map(|it| it.caption()).collect();
            println!("   {label}: {}", captions.join(", "));
        }
    }

    let n = outfit.item_ids.len();
    if missing > 0 {
        println!("   {n} item{} ({missing} deleted)", if n == 1 { "" } else { "s" });
    } else {
        println!("   {n} item{}", if n == 1 { "" } else { "s" });
    }
}

fn print_staged(staged: &StagedImport) {
    println!("{} Preview:", staged.summary());
    for caption in staged.preview(IMPORT_PREVIEW) {
        println!("   {caption}");
    }
    if staged.skipped > 0 {
        println!("   ({} invalid entries ignored)", staged.skipped);
    }
}
