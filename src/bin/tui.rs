use anyhow::Result;
use newshound::location::SearchParams;

const USAGE: &str = "usage: newshound [QUERY]

QUERY is an optional link to open, e.g. start=2024-01-07&display=events&event=17

Environment:
  NEWSHOUND_CONFIG  config file to use
  NEWSHOUND_LOG     log filter (default: info)";

#[tokio::main]
async fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.iter().any(|a| a == "-h" || a == "--help") || args.len() > 1 {
        println!("{}", USAGE);
        return Ok(());
    }
    let initial = args
        .first()
        .map(|q| SearchParams::parse(q))
        .unwrap_or_default();

    let _guard = newshound::tui::init_logging()?;
    newshound::tui::run(initial).await
}
