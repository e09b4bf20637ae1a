use clap::{Parser, Subcommand};
use spacetraveling::cms::ApiClient;
use spacetraveling::config::{self, SiteConfig};
use spacetraveling::pagination::PaginationState;
use spacetraveling::preview::PreviewSession;
use spacetraveling::{fetch, generate, output, telemetry};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "spacetraveling")]
#[command(about = "Static blog generator backed by a headless CMS")]
#[command(long_about = "\
Static blog generator backed by a headless CMS

Posts are documents in a hosted document API (Prismic-style). The build
fetches them into a manifest, then renders plain HTML:

  .spacetraveling-temp/
  └── manifest.json                # Fetched posts, first list page, preview flag
  dist/
  ├── index.html                   # Post list with \"load more\"
  ├── 404.html                     # Fallback page
  └── post/<uid>/index.html        # One page per post

Preview builds pass a CMS ref with --preview-ref (or SPACETRAVELING_PREVIEW_REF);
every query then reads draft content and pages carry an exit-preview button.

Run 'spacetraveling gen-config' to generate a documented config.toml.")]
#[command(version)]
struct Cli {
    /// Config file
    #[arg(long, default_value = "config.toml", global = true)]
    config: PathBuf,

    /// Output directory
    #[arg(long, default_value = "dist", global = true)]
    output: PathBuf,

    /// Directory for intermediate files (manifest)
    #[arg(long, default_value = ".spacetraveling-temp", global = true)]
    temp_dir: PathBuf,

    /// CMS ref of preview content; omit for published content
    #[arg(long, env = "SPACETRAVELING_PREVIEW_REF", global = true)]
    preview_ref: Option<String>,

    /// Access token of a private CMS repository (overrides config)
    #[arg(
        long,
        env = "SPACETRAVELING_ACCESS_TOKEN",
        hide_env_values = true,
        global = true
    )]
    access_token: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Fetch posts from the document API into a manifest
    Fetch,
    /// Produce the final HTML site from the manifest
    Generate,
    /// Run the full pipeline: fetch → generate
    Build,
    /// Load the next page of the post list into the manifest
    LoadMore {
        /// Print the resulting list state as JSON
        #[arg(long)]
        json: bool,
    },
    /// Validate config and query the first page without building
    Check,
    /// Print a stock config.toml with all options documented
    GenConfig,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let manifest_path = fetch::manifest_path(&cli.temp_dir);
    let session = PreviewSession::new(cli.preview_ref.clone());

    match &cli.command {
        Command::Fetch => {
            let site_config = setup(&cli)?;
            let client = api_client(&site_config)?;
            let result = fetch::fetch(&client, &site_config, &session).await?;
            fetch::write_manifest(&result.manifest, &manifest_path)?;
            output::print_fetch_output(&result);
        }
        Command::Generate => {
            setup(&cli)?;
            let manifest =
                generate::generate(&manifest_path, &cli.output, config_root(&cli.config))?;
            output::print_generate_output(&manifest);
        }
        Command::Build => {
            let site_config = setup(&cli)?;
            let client = api_client(&site_config)?;

            println!("==> Stage 1: Fetching posts from {}", client.endpoint());
            let result = fetch::fetch(&client, &site_config, &session).await?;
            fetch::write_manifest(&result.manifest, &manifest_path)?;
            output::print_fetch_output(&result);

            println!("==> Stage 2: Generating HTML \u{2192} {}", cli.output.display());
            let manifest =
                generate::generate(&manifest_path, &cli.output, config_root(&cli.config))?;
            output::print_generate_output(&manifest);

            println!("==> Build complete: {}", cli.output.display());
        }
        Command::LoadMore { json } => {
            let site_config = setup(&cli)?;
            let client = api_client(&site_config)?;
            let before = fetch::read_manifest(&manifest_path)?.index.posts().len();
            let manifest = fetch::load_more(&client, &manifest_path).await?;
            if *json {
                println!("{}", serde_json::to_string_pretty(&manifest.index)?);
            } else {
                output::print_load_more_output(before, &manifest.index);
            }
        }
        Command::Check => {
            let site_config = setup(&cli)?;
            let client = api_client(&site_config)?;
            println!("==> Checking {}", client.endpoint());
            let response = fetch::query_first_page(&client, &site_config, &session).await?;
            let first_page = PaginationState::first_page(response)?;
            output::print_check_output(&site_config, &first_page);
            println!("==> Config and API are valid");
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Load the config, apply CLI overrides, and install logging.
fn setup(cli: &Cli) -> Result<SiteConfig, Box<dyn std::error::Error>> {
    let mut site_config = config::load_config(&cli.config)?;
    if let Some(token) = &cli.access_token {
        site_config.cms.access_token = Some(token.clone());
    }
    telemetry::init(&site_config.logging)?;
    Ok(site_config)
}

fn api_client(site_config: &SiteConfig) -> Result<ApiClient, Box<dyn std::error::Error>> {
    let endpoint = site_config.require_endpoint()?;
    Ok(ApiClient::new(endpoint, site_config.cms.access_token.clone())?)
}

/// Directory that relative config paths (such as `site.assets_dir`) resolve against.
fn config_root(config_path: &Path) -> &Path {
    match config_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    }
}
