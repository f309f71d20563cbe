use anyhow::Context;
use clap::Parser;
use model_scaffold::{CliArgs, LoggingConfig, ScaffoldConfig, Scaffolder, init_logging};

fn main() -> anyhow::Result<()> {
    let logging_config = LoggingConfig::from_env();
    let _guard = init_logging(logging_config)?;

    let CliArgs {
        model,
        fields,
        report,
        config,
    } = CliArgs::parse();
    let config = ScaffoldConfig::from_args(config)?;

    // Fail fast before discovery touches the models directory.
    config.validate()?;

    let mut session = Scaffolder::new(&model, config)
        .with_context(|| format!("failed to start scaffold session for '{model}'"))?;
    for (name, ty) in &fields {
        session
            .add_field(name, ty)
            .with_context(|| format!("rejected field {name}:{ty}"))?;
    }

    let generation = session.generate()?;
    for artifact in &generation.artifacts {
        tracing::info!(kind = %artifact.kind, path = %artifact.path.display(), "generated");
    }
    if report {
        println!(
            "{}",
            serde_json::to_string_pretty(&generation).context("failed to serialize report")?
        );
    }
    Ok(())
}
