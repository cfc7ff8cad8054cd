use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, ValueEnum};
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

use veille::{
    load_prompts, load_recipients, load_template, prompt_for, ClientConfig, EmailStatus,
    PerplexityClient, ReportKind, ReportPeriod, ReportRequest, RunReportUseCase, SmtpConfig,
    SmtpSender,
};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ReportType {
    #[value(name = "veille_juridique")]
    VeilleJuridique,
    #[value(name = "veille_pedagogique_technologique")]
    VeillePedagogiqueTechnologique,
}

impl From<ReportType> for ReportKind {
    fn from(value: ReportType) -> Self {
        match value {
            ReportType::VeilleJuridique => ReportKind::Juridique,
            ReportType::VeillePedagogiqueTechnologique => ReportKind::PedagogiqueTechnologique,
        }
    }
}

#[derive(Parser)]
#[command(name = "veille")]
#[command(author, version, about = "Automated monitoring reports delivered by email", long_about = None)]
struct Cli {
    /// Type of monitoring to perform
    #[arg(short = 't', long = "type", value_enum, default_value = "veille_juridique")]
    report_type: ReportType,

    /// Number of days to look back from today for the report start date
    #[arg(short, long, default_value_t = 60)]
    days: i64,

    #[arg(short, long)]
    verbose: bool,

    /// Prompt document (JSON keyed by report type)
    #[arg(long, default_value = "prompts/prompts.json")]
    prompts: String,

    /// HTML email template; when missing the answer is sent without wrapping
    #[arg(long, default_value = "templates/email_template.html")]
    template: String,

    /// Recipients document ({"to": [...], "cc": [...]})
    #[arg(long, default_value = "recipients.json")]
    recipients: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    // Pick up PERPLEXITY_* / SMTP_* variables from a local .env if present.
    dotenvy::dotenv().ok();

    let kind: ReportKind = cli.report_type.into();
    let period = ReportPeriod::ending_today(cli.days);
    info!(
        kind = %kind,
        start = %period.start_str(),
        end = %period.end_str(),
        "Starting veille run"
    );

    let client_config = ClientConfig::from_env()?;
    let chat = Arc::new(PerplexityClient::new(&client_config)?);

    let smtp_config = SmtpConfig::from_env()?;
    let sender = Arc::new(SmtpSender::new(&smtp_config)?);

    let prompts = load_prompts(&cli.prompts)?;
    let prompt = prompt_for(&prompts, kind)?;
    let recipients = load_recipients(&cli.recipients)?;

    let template = match load_template(&cli.template) {
        Ok(t) => Some(t),
        Err(e) => {
            tracing::warn!("Email template unavailable ({e}); sending the answer unwrapped");
            None
        }
    };

    let use_case = RunReportUseCase::new(chat, sender);
    let outcome = use_case
        .execute(&ReportRequest {
            kind,
            period,
            prompt,
            template,
            recipients,
        })
        .await?;

    println!("{}", outcome.answer);

    match outcome.email {
        EmailStatus::Sent => {
            info!("Run completed; report emailed");
            Ok(())
        }
        EmailStatus::Skipped(reason) => {
            info!("Run completed; email skipped ({reason})");
            Ok(())
        }
        EmailStatus::Failed(reason) => {
            error!("Report generated but email delivery failed: {reason}");
            anyhow::bail!("email delivery failed: {reason}")
        }
    }
}

#[cfg(test)]
mod cli_tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let cli = Cli::try_parse_from(["veille"]).expect("parse");
        assert!(matches!(cli.report_type, ReportType::VeilleJuridique));
        assert_eq!(cli.days, 60);
    }

    #[test]
    fn type_accepts_underscore_identifiers() {
        let cli = Cli::try_parse_from(["veille", "-t", "veille_pedagogique_technologique", "-d", "30"])
            .expect("parse");
        assert!(matches!(
            cli.report_type,
            ReportType::VeillePedagogiqueTechnologique
        ));
        assert_eq!(cli.days, 30);
    }

    #[test]
    fn unknown_type_is_rejected() {
        let res = Cli::try_parse_from(["veille", "--type", "veille_inconnue"]);
        assert!(res.is_err());
    }
}
