//! Module for the "deposit" command.

use super::*;

/// Arguments that can be used for the [`Commands::Deposit`]
#[derive(Args, Clone, Debug)]
pub struct DepositArgs {
  /// Markdown document to deposit, or a directory searched for `*.md` documents
  #[arg(long, short)]
  pub file: Option<PathBuf>,

  /// Upload type of the deposits, e.g. "presentation" or "dataset"
  #[arg(long = "type", short = 't')]
  pub upload_type: Option<UploadType>,

  /// Use sandbox.zenodo.org instead of zenodo.org
  #[arg(long)]
  pub sandbox: bool,

  /// Publish each deposit after uploading its files
  #[arg(long)]
  pub publish: bool,
}

/// Function for the [`Commands::Deposit`] in the CLI.
pub async fn deposit<I: UserInteraction>(
  interaction: &I,
  config: Config,
  deposit_args: DepositArgs,
) -> Result<Vec<DepositOutcome>> {
  let DepositArgs { file, upload_type, sandbox, publish } = deposit_args;
  let token = access_token()?;

  let file = match file {
    Some(file) => file,
    None => PathBuf::from(interaction.prompt("Document or directory to deposit", ".")?),
  };
  let upload_type = match upload_type.or(config.upload_type) {
    Some(upload_type) => upload_type,
    None => {
      let names = UploadType::ALL.map(|upload_type| upload_type.as_str());
      let default = UploadType::ALL
        .iter()
        .position(|upload_type| *upload_type == UploadType::Presentation)
        .unwrap_or_default();
      UploadType::ALL[interaction.select("Upload type", &names, default)?]
    },
  };

  let articles = collect_articles(&file)?;
  interaction.reply(ResponseContent::Info(&format!(
    "Depositing {} article(s) from {} as {upload_type}",
    articles.len(),
    file.display()
  )))?;

  let publish = if publish || config.publish {
    let confirmed = interaction.confirm("Publishing cannot be undone. Publish the deposits?")?;
    if !confirmed {
      interaction.reply(ResponseContent::Warning("Deposits will be left unpublished"))?;
    }
    confirmed
  } else {
    false
  };

  let config = Config { sandbox: sandbox || config.sandbox, ..config };
  if config.sandbox {
    interaction.reply(ResponseContent::Info("Using the Zenodo sandbox"))?;
  }
  let (api_url, web_url) = config.base_urls();
  debug!("Depositing to {api_url}");
  let client = ZenodoClient::with_base_url(&token, &api_url, &web_url)?;

  let outcomes = Depositor::new(client, upload_type)
    .with_publish(publish)
    .with_communities(config.communities.clone())
    .run(articles)
    .await?;
  for outcome in &outcomes {
    interaction.reply(ResponseContent::Outcome(outcome))?;
  }
  interaction.reply(ResponseContent::Success(&format!("{} deposit(s) done", outcomes.len())))?;
  Ok(outcomes)
}
