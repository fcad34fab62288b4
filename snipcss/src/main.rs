use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use log::info;
use snipcss_lib::menu::{ContextMenu, MenuAction};
use snipcss_lib::snippet::SnipConfig;
use snipcss_lib::style::stylesheet::StyleSheet;
use snipcss_lib::Page;
use std::fs;
use std::path::PathBuf;

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum Action {
    /// The element's markup.
    Html,
    /// Used CSS plus the element's markup.
    HtmlCss,
    /// The whole document.
    Page,
}

impl From<Action> for MenuAction {
    fn from(action: Action) -> Self {
        match action {
            Action::Html => MenuAction::CopyHtml,
            Action::HtmlCss => MenuAction::CopyHtmlAndCss,
            Action::Page => MenuAction::CopyPage,
        }
    }
}

#[derive(Parser)]
#[command(name = "SnipCSS")]
#[command(about = "Copy an element's HTML together with the CSS rules it uses")]
struct Args {
    /// Input HTML file. Relative stylesheet links resolve against its directory.
    input: PathBuf,

    /// Selector of the element to copy (first match). Defaults to <body>.
    #[arg(short, long)]
    select: Option<String>,

    /// What to copy.
    #[arg(short, long, value_enum, default_value_t = Action::HtmlCss)]
    action: Action,

    /// Extra stylesheet, applied after the document's own. Repeatable.
    #[arg(long = "css")]
    css: Vec<PathBuf>,

    /// Snap the selected element to its enclosing component (.card, .btn, nav, ...).
    #[arg(long)]
    snap: bool,

    /// Write the snippet here instead of stdout.
    #[arg(short, long)]
    output: Option<PathBuf>,
}

fn main() {
    env_logger::init();

    // parse the args given in terminal
    let args: Args = Args::parse();

    if let Err(e) = run(&args) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn run(args: &Args) -> Result<()> {
    let html_content = fs::read_to_string(&args.input)
        .with_context(|| format!("reading HTML file {}", args.input.display()))?;
    info!("Successfully read the HTML file.");

    let mut page = Page::parse(&html_content, args.input.parent());
    for css_path in &args.css {
        page.add_style_sheet(StyleSheet::from_file(css_path, None));
    }

    let picked = match &args.select {
        Some(selector) => page.select(selector)?,
        None => page.default_target()?,
    };

    let config = SnipConfig {
        snap_to_component: args.snap,
        ..SnipConfig::default()
    };
    let snippet = ContextMenu::open(&page, picked, &config).choose(args.action.into());

    match &args.output {
        Some(path) => {
            fs::write(path, &snippet)
                .with_context(|| format!("writing snippet to {}", path.display()))?;
            info!("Snippet written to {}", path.display());
        }
        None => println!("{}", snippet),
    }
    Ok(())
}
