use clap::{Args, CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use std::io;

use crate::commands::{ContactFields, ContactListArgs, EmailFlags};
use crate::model::{CampaignStatus, ContactSource, Platform};
use crate::query::{EmailFolder, Subscription};

#[derive(Parser)]
#[command(name = "mailboard")]
#[command(about = "Contacts, campaigns and inbox from the email marketing dashboard")]
#[command(version)]
pub struct Cli {
    /// Log debug output to stderr (RUST_LOG takes precedence)
    #[arg(long, short, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Output format shared by every command.
#[derive(Args, Debug, Clone, Copy, Default)]
pub struct OutputOptions {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Sign in and store the session
    Login {
        /// Account email address
        email: String,

        /// Password (prompted on stdin if omitted)
        #[arg(long)]
        password: Option<String>,

        #[command(flatten)]
        output: OutputOptions,
    },

    /// Clear the stored session
    Logout {
        #[command(flatten)]
        output: OutputOptions,
    },

    /// Show the signed-in user
    Whoami {
        #[command(flatten)]
        output: OutputOptions,
    },

    /// Browse and edit contacts
    #[command(visible_alias = "c")]
    Contacts {
        #[command(subcommand)]
        action: ContactAction,
    },

    /// Browse ad campaigns
    Campaigns {
        #[command(subcommand)]
        action: CampaignAction,
    },

    /// Browse the inbox
    #[command(visible_alias = "e")]
    Emails {
        #[command(subcommand)]
        action: EmailAction,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        shell: Shell,
    },
}

#[derive(Subcommand)]
pub enum ContactAction {
    /// List one page of contacts
    Ls {
        #[command(flatten)]
        args: ContactListArgs,

        #[command(flatten)]
        output: OutputOptions,
    },
    /// Show a contact
    Show {
        id: String,

        #[command(flatten)]
        output: OutputOptions,
    },
    /// Create a contact
    Add {
        /// Email address of the new contact
        #[arg(value_name = "EMAIL")]
        address: String,

        #[command(flatten)]
        fields: ContactFields,

        #[command(flatten)]
        output: OutputOptions,
    },
    /// Update fields of a contact
    Update {
        id: String,

        #[command(flatten)]
        fields: ContactFields,

        #[command(flatten)]
        output: OutputOptions,
    },
    /// Delete a contact
    Rm {
        id: String,

        #[command(flatten)]
        output: OutputOptions,
    },
}

#[derive(Subcommand)]
pub enum CampaignAction {
    /// List one page of campaigns
    Ls {
        /// Page to show (1-based)
        #[arg(long, default_value_t = 1)]
        page: u32,

        /// Match against the campaign name
        #[arg(long, short)]
        search: Option<String>,

        /// Facebook, Google, TikTok, X or LinkedIn
        #[arg(long, value_parser = parse_platform)]
        platform: Option<String>,

        /// active, paused or completed
        #[arg(long, value_parser = parse_campaign_status)]
        status: Option<String>,

        #[command(flatten)]
        output: OutputOptions,
    },
    /// Show a campaign with its derived metrics
    Show {
        id: String,

        #[command(flatten)]
        output: OutputOptions,
    },
}

#[derive(Subcommand)]
pub enum EmailAction {
    /// List one page of a mailbox folder
    Ls {
        /// inbox, starred, important, sent, drafts or trash
        #[arg(long, value_parser = parse_folder)]
        folder: Option<String>,

        /// Page to show (1-based)
        #[arg(long, default_value_t = 1)]
        page: u32,

        /// Match against sender, subject and preview
        #[arg(long, short)]
        search: Option<String>,

        #[command(flatten)]
        output: OutputOptions,
    },
    /// Show an email
    Show {
        id: String,

        #[command(flatten)]
        output: OutputOptions,
    },
    /// Change read, starred or important flags
    Mark {
        id: String,

        #[command(flatten)]
        flags: EmailFlags,

        #[command(flatten)]
        output: OutputOptions,
    },
}

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Show current configuration
    Show {
        #[command(flatten)]
        output: OutputOptions,
    },
    /// Set a configuration value
    Set {
        /// Configuration key (e.g. list.page_size)
        key: String,
        /// Value to set
        value: String,

        #[command(flatten)]
        output: OutputOptions,
    },
    /// Get a configuration value
    Get {
        /// Configuration key (e.g. api.base_url)
        key: String,

        #[command(flatten)]
        output: OutputOptions,
    },
}

impl Commands {
    /// Execute the command, dispatching to the appropriate handler.
    pub async fn run(self) -> crate::error::Result<()> {
        use crate::commands::{
            cmd_campaigns_ls, cmd_campaigns_show, cmd_config_get, cmd_config_set,
            cmd_config_show, cmd_contacts_add, cmd_contacts_ls, cmd_contacts_rm,
            cmd_contacts_show, cmd_contacts_update, cmd_emails_ls, cmd_emails_mark,
            cmd_emails_show, cmd_login, cmd_logout, cmd_whoami,
        };

        match self {
            Commands::Login {
                email,
                password,
                output,
            } => cmd_login(&email, password, output).await,
            Commands::Logout { output } => cmd_logout(output),
            Commands::Whoami { output } => cmd_whoami(output),

            Commands::Contacts { action } => match action {
                ContactAction::Ls { args, output } => cmd_contacts_ls(args, output).await,
                ContactAction::Show { id, output } => cmd_contacts_show(&id, output).await,
                ContactAction::Add {
                    address,
                    fields,
                    output,
                } => cmd_contacts_add(&address, fields, output).await,
                ContactAction::Update { id, fields, output } => {
                    cmd_contacts_update(&id, fields, output).await
                }
                ContactAction::Rm { id, output } => cmd_contacts_rm(&id, output).await,
            },

            Commands::Campaigns { action } => match action {
                CampaignAction::Ls {
                    page,
                    search,
                    platform,
                    status,
                    output,
                } => {
                    cmd_campaigns_ls(
                        page,
                        search.as_deref(),
                        platform.as_deref(),
                        status.as_deref(),
                        output,
                    )
                    .await
                }
                CampaignAction::Show { id, output } => cmd_campaigns_show(&id, output).await,
            },

            Commands::Emails { action } => match action {
                EmailAction::Ls {
                    folder,
                    page,
                    search,
                    output,
                } => cmd_emails_ls(folder.as_deref(), page, search.as_deref(), output).await,
                EmailAction::Show { id, output } => cmd_emails_show(&id, output).await,
                EmailAction::Mark { id, flags, output } => {
                    cmd_emails_mark(&id, flags, output).await
                }
            },

            Commands::Config { action } => match action {
                ConfigAction::Show { output } => cmd_config_show(output),
                ConfigAction::Set { key, value, output } => cmd_config_set(&key, &value, output),
                ConfigAction::Get { key, output } => cmd_config_get(&key, output),
            },

            Commands::Completions { shell } => {
                generate_completions(shell);
                Ok(())
            }
        }
    }
}

/// Check a filter value with `parser`, listing the accepted values on failure.
/// `all` is accepted everywhere and clears the filter.
fn parse_with_validation<T, F>(
    s: &str,
    parser: F,
    field_name: &str,
    valid_values: &[T],
) -> Result<String, String>
where
    T: std::fmt::Display,
    F: FnOnce(&str) -> Result<T, crate::error::MailboardError>,
{
    if s.trim().eq_ignore_ascii_case("all") {
        return Ok("all".to_string());
    }
    parser(s.trim()).map(|v| v.to_string()).map_err(|_| {
        let valid: Vec<String> = valid_values.iter().map(ToString::to_string).collect();
        format!(
            "Invalid {}. Must be one of: all, {}",
            field_name,
            valid.join(", ")
        )
    })
}

pub(crate) fn parse_contact_source(s: &str) -> Result<String, String> {
    parse_with_validation(s, str::parse::<ContactSource>, "source", ContactSource::ALL)
}

pub(crate) fn parse_subscription(s: &str) -> Result<String, String> {
    parse_with_validation(
        s,
        str::parse::<Subscription>,
        "subscription",
        Subscription::ALL,
    )
}

fn parse_platform(s: &str) -> Result<String, String> {
    parse_with_validation(s, str::parse::<Platform>, "platform", Platform::ALL)
}

fn parse_campaign_status(s: &str) -> Result<String, String> {
    parse_with_validation(
        s,
        str::parse::<CampaignStatus>,
        "status",
        CampaignStatus::ALL,
    )
}

fn parse_folder(s: &str) -> Result<String, String> {
    parse_with_validation(s, str::parse::<EmailFolder>, "folder", EmailFolder::ALL)
}

pub fn generate_completions(shell: Shell) {
    let mut cmd = Cli::command();
    clap_complete::generate(shell, &mut cmd, "mailboard", &mut io::stdout());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_platform_normalizes_case() {
        assert_eq!(parse_platform("tiktok").unwrap(), "TikTok");
        assert_eq!(parse_platform("FACEBOOK").unwrap(), "Facebook");
    }

    #[test]
    fn test_parse_accepts_all() {
        assert_eq!(parse_campaign_status("All").unwrap(), "all");
        assert_eq!(parse_folder("all").unwrap(), "all");
    }

    #[test]
    fn test_parse_error_lists_valid_values() {
        let err = parse_contact_source("podcast").unwrap_err();
        assert!(
            err.contains("website") && err.contains("referral"),
            "Error should list valid source values, got: {err}"
        );
        assert!(parse_subscription("maybe").is_err());
    }

    #[test]
    fn test_parse_contacts_ls_args() {
        let cli = Cli::try_parse_from([
            "mailboard",
            "contacts",
            "ls",
            "--search",
            "acme",
            "--page",
            "2",
            "--source",
            "Referral",
            "--json",
        ])
        .unwrap();
        match cli.command {
            Commands::Contacts {
                action: ContactAction::Ls { args, output },
            } => {
                assert_eq!(args.page, 2);
                assert_eq!(args.search.as_deref(), Some("acme"));
                assert_eq!(args.source.as_deref(), Some("referral"));
                assert!(output.json);
            }
            _ => panic!("expected contacts ls"),
        }
    }

    #[test]
    fn test_mark_flags_conflict() {
        let result = Cli::try_parse_from(["mailboard", "emails", "mark", "7", "--read", "--unread"]);
        assert!(result.is_err());
    }
}
