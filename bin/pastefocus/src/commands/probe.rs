use std::path::{Path, PathBuf};
use std::rc::Rc;

use anyhow::Context;
use pastefocus_core::Config;
use pastefocus_locator::{
    Assistant, Document, FixtureDocument, KeyStroke, ManualScheduler, TriggerOutcome,
};

pub struct ProbeOptions {
    pub file: PathBuf,
    pub url: String,
    pub paste: bool,
    pub active_id: Option<String>,
    /// Target URL and the markup that replaces the body.
    pub navigation: Option<(String, PathBuf)>,
}

fn read_markup(path: &Path) -> anyhow::Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))
}

pub fn run(options: &ProbeOptions, config: &Config) -> anyhow::Result<()> {
    let markup = read_markup(&options.file)?;
    let document = Rc::new(FixtureDocument::parse(&options.url, &markup)?);
    let scheduler = Rc::new(ManualScheduler::new());
    let mut assistant = Assistant::new(Rc::clone(&document), scheduler.clone(), config);

    assistant.start()?;
    scheduler.advance(config.startup_scan_delay());

    println!("pastefocus probe");
    println!("================");
    println!("Page:      {}", options.file.display());
    println!("URL:       {}", document.location());
    println!("Platform:  {}", assistant.platform());

    let inventory = assistant.pipeline().inventory(document.as_ref());
    println!(
        "Found:     {} textarea(s), {} rich-text region(s)",
        inventory.textareas, inventory.rich_text
    );
    print_discovery(&assistant);

    if let Some((url, next)) = &options.navigation {
        let next_markup = read_markup(next)?;
        document.push_state(url);
        document.replace_body(&next_markup)?;
        let batch = document.take_mutations();
        let rescan = assistant.on_mutations(batch);
        scheduler.advance(config.rescan_delay());

        println!();
        println!("Navigated: {}", assistant.watcher().last_known_url());
        println!(
            "Rescan:    {}",
            if rescan.is_some() { "✓ ran" } else { "✗ not scheduled" }
        );
        print_discovery(&assistant);
    }

    if let Some(id) = &options.active_id {
        let element = document
            .element_by_id(id)
            .with_context(|| format!("no element with id {:?}", id))?;
        document.set_active(Some(element));
    }

    if options.paste {
        let outcome = assistant.on_key_down(&KeyStroke::ctrl(&config.shortcut_key));
        println!();
        println!("Paste:     {}", describe_outcome(&outcome));
        if let Some(active) = document.active_element() {
            println!("Focus:     {}", document.describe(&active));
            if let Some((start, end)) = document.selection_range(active) {
                println!("Selection: {}..{}", start, end);
            }
        }
        if let Some(caret) = document.selection() {
            println!(
                "Caret:     {} @ {}",
                document.describe(&caret.container),
                caret.offset
            );
        }
    }

    Ok(())
}

fn print_discovery(assistant: &Assistant<FixtureDocument>) {
    let document = assistant.document();
    match assistant.pipeline().find(document.as_ref()) {
        Some(discovery) => {
            println!(
                "Input:     {} (pattern #{} {}, {})",
                document.describe(&discovery.element),
                discovery.pattern_index,
                discovery.pattern,
                discovery.pattern.group
            );
        }
        None => println!("Input:     ✗ none usable"),
    }
}

fn describe_outcome(outcome: &TriggerOutcome) -> String {
    match outcome {
        TriggerOutcome::NotShortcut => "ignored (not the shortcut)".to_string(),
        TriggerOutcome::AlreadyEditing => "skipped (focus already in an input)".to_string(),
        TriggerOutcome::NothingFound => "✗ no input found".to_string(),
        TriggerOutcome::Focused(placement) => format!("✓ focused ({:?})", placement),
        TriggerOutcome::Failed(reason) => format!("✗ failed: {}", reason),
    }
}
