use anyhow::{Context, Result};
use clap::Parser;
use hugfusion::ai::{GeminiHugClient, HugGenerationService, MockHugClient};
use hugfusion::models::{Config, HugStyle};
use hugfusion::session::{Phase, SessionController, GENERATION_FAILED_MESSAGE};
use hugfusion::upload::{CandidateFile, SlotId, UploadPolicy};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(name = "hugfusion")]
#[command(about = "Merge two smiles into one hug")]
struct CliArgs {
    /// Photo of the first person (PNG, JPG, JPEG up to 10MB).
    #[arg(value_name = "PERSON1")]
    person1: PathBuf,

    /// Photo of the second person.
    #[arg(value_name = "PERSON2")]
    person2: PathBuf,

    #[arg(long, value_enum, default_value_t = HugStyle::Realistic)]
    style: HugStyle,

    /// Directory the generated image is written to.
    #[arg(long, value_name = "DIR", default_value = "output")]
    out_dir: PathBuf,

    /// Also write a share bundle (image + share.json) to DIR/share.
    #[arg(long)]
    share: bool,

    /// Use the built-in mock generator instead of calling Gemini.
    #[arg(long)]
    dry_run: bool,
}

fn build_service(config: &Config, dry_run: bool) -> Arc<dyn HugGenerationService> {
    if dry_run {
        info!("Dry run: images will not be sent to Gemini");
        Arc::new(MockHugClient::new())
    } else {
        info!("Image provider: Gemini (model: {})", config.model);
        Arc::new(GeminiHugClient::from_config(config))
    }
}

async fn run(args: CliArgs) -> Result<bool> {
    let config = Config::from_env()?;
    let mut session = SessionController::new(build_service(&config, args.dry_run));

    info!("Accepting {}", UploadPolicy::DEFAULT.accept_attribute());

    let mut rejected = false;
    for (slot, path) in [(SlotId::Person1, &args.person1), (SlotId::Person2, &args.person2)] {
        let file = CandidateFile::from_path(path)
            .await
            .with_context(|| format!("Cannot open {}", path.display()))?;
        if let Err(rejection) = session.submit_file(slot, &file).await {
            error!("[{}] {}: {}", slot.label(), path.display(), rejection);
            rejected = true;
        }
    }
    if rejected {
        return Ok(false);
    }

    session.set_style(args.style);
    info!("Fusing your images into a {}...", args.style.label().to_lowercase());

    if !session.trigger_generate() {
        if let Some(notice) = session.state().notice {
            error!("{}", notice.message());
        }
        return Ok(false);
    }

    match session.wait_until_settled().await {
        Phase::Result => {
            if let Some(artifact) = session.download()? {
                let path = artifact.save_to(&args.out_dir).await?;
                info!("Here's your hug! {}", path.display());
            }
            if args.share {
                if let Some(payload) = session.share()? {
                    payload.save_to(&args.out_dir.join("share")).await?;
                }
            }
            Ok(true)
        }
        _ => {
            let message = session
                .state()
                .error
                .as_ref()
                .map(|failure| failure.message.as_str())
                .unwrap_or(GENERATION_FAILED_MESSAGE);
            error!("{}", message);
            Ok(false)
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "hugfusion=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting hugfusion");

    let args = CliArgs::parse();

    match run(args).await {
        Ok(true) => {
            info!("Generation completed successfully");
            Ok(())
        }
        Ok(false) => std::process::exit(1),
        Err(e) => {
            error!("Generation failed: {:#}", e);
            std::process::exit(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_default_style_and_dir() {
        let args = CliArgs::try_parse_from(["hugfusion", "a.jpg", "b.png"]).unwrap();
        assert_eq!(args.style, HugStyle::Realistic);
        assert_eq!(args.out_dir, PathBuf::from("output"));
        assert!(!args.share);
        assert!(!args.dry_run);
    }

    #[test]
    fn test_args_cartoon_style() {
        let args =
            CliArgs::try_parse_from(["hugfusion", "a.jpg", "b.png", "--style", "cartoon"]).unwrap();
        assert_eq!(args.style, HugStyle::Cartoon);
    }

    #[test]
    fn test_args_reject_unknown_style() {
        let parsed = CliArgs::try_parse_from(["hugfusion", "a.jpg", "b.png", "--style", "oil"]);
        assert!(parsed.is_err());
    }

    #[test]
    fn test_args_require_two_photos() {
        assert!(CliArgs::try_parse_from(["hugfusion", "a.jpg"]).is_err());
    }
}
