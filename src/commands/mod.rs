//! Command implementations behind the CLI.

mod auth;
mod campaigns;
mod config;
mod contacts;
mod emails;

pub use auth::{cmd_login, cmd_logout, cmd_whoami};
pub use campaigns::{cmd_campaigns_ls, cmd_campaigns_show};
pub use config::{cmd_config_get, cmd_config_set, cmd_config_show};
pub use contacts::{
    ContactFields, ContactListArgs, cmd_contacts_add, cmd_contacts_ls, cmd_contacts_rm,
    cmd_contacts_show, cmd_contacts_update,
};
pub use emails::{EmailFlags, cmd_emails_ls, cmd_emails_mark, cmd_emails_show};

use std::sync::Arc;

use owo_colors::OwoColorize;
use serde::Serialize;
use serde_json::Value;

use crate::cli::OutputOptions;
use crate::config::Config;
use crate::display;
use crate::error::{MailboardError, Result};
use crate::list::{ListController, ListView, ViewState};
use crate::model::Record;
use crate::query::{FilterSet, PageResult, QueryDescriptor};
use crate::remote::ApiClient;
use crate::session::{FileStorage, SessionStore};

/// Output of a command, rendered as JSON or text.
pub struct CommandOutput {
    json: Value,
    text: Option<String>,
}

impl CommandOutput {
    pub fn new(json: Value) -> Self {
        Self { json, text: None }
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn print(self, output: OutputOptions) -> Result<()> {
        match (output.json, self.text) {
            (false, Some(text)) => {
                println!("{text}");
                Ok(())
            }
            _ => print_json(&self.json),
        }
    }
}

pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Loaded configuration plus the hydrated session.
pub struct AppContext {
    pub config: Config,
    pub session: SessionStore,
}

impl AppContext {
    pub fn load() -> Result<Self> {
        let config = Config::load()?;
        let storage = FileStorage::new(Config::session_path()?);
        let session = SessionStore::hydrate(Arc::new(storage))?;
        Ok(Self { config, session })
    }

    pub fn client(&self) -> Result<ApiClient> {
        ApiClient::from_config(&self.config, self.session.clone())
    }

    /// Client for commands that need a signed-in user.
    pub fn authenticated_client(&self) -> Result<ApiClient> {
        if !self.session.is_authenticated() {
            return Err(MailboardError::NotSignedIn);
        }
        self.client()
    }
}

/// A record type the CLI can list.
pub(crate) trait Listable: Record + Serialize {
    /// Plural noun used in empty states.
    const NOUN: &'static str;

    fn table(items: &[Self]) -> String;

    fn to_json(&self) -> Result<Value> {
        Ok(serde_json::to_value(self)?)
    }
}

fn page_json<R: Listable>(page: &PageResult<R>) -> Result<Value> {
    let items = page
        .items
        .iter()
        .map(R::to_json)
        .collect::<Result<Vec<_>>>()?;
    Ok(serde_json::json!({
        "items": items,
        "pagination": page.pagination,
    }))
}

/// Load one page through a list view and print it.
pub(crate) async fn run_list<F, R>(
    view: ListView<F, R>,
    output: OutputOptions,
) -> Result<()>
where
    F: FilterSet,
    R: Listable,
{
    view.start()
        .await
        .map_err(|e| MailboardError::Other(format!("loading {} failed: {e}", R::NOUN)))?;
    let state = view.settled().await;
    let query = view.query();

    match state {
        ViewState::Ready(page) => {
            let text = render_page(&page, &query, view.inspect(|c| c.page_window()));
            CommandOutput::new(page_json(&page)?)
                .with_text(text)
                .print(output)
        }
        ViewState::Revalidating(page) => {
            let text = render_page(&page, &query, view.inspect(|c| c.page_window()));
            CommandOutput::new(page_json(&page)?)
                .with_text(format!("{}\n{text}", display::stale_badge()))
                .print(output)
        }
        ViewState::Empty(empty) => {
            let json = match view.inspect(|c| c.page().cloned()) {
                Some(page) => page_json(&page)?,
                None => Value::Null,
            };
            CommandOutput::new(json)
                .with_text(display::empty_panel(empty, R::NOUN))
                .print(output)
        }
        ViewState::Error { error, .. } => Err(error.into()),
        ViewState::Idle | ViewState::Loading => Err(MailboardError::Other(format!(
            "{} did not finish loading",
            R::NOUN
        ))),
    }
}

fn render_page<F: FilterSet, R: Listable>(
    page: &PageResult<R>,
    query: &QueryDescriptor<F>,
    window: Option<crate::list::PageWindow>,
) -> String {
    let mut text = R::table(&page.items);
    text.push('\n');
    text.push_str(
        &display::results_summary(
            query.page(),
            query.limit(),
            page.items.len(),
            page.pagination.total,
        )
        .dimmed()
        .to_string(),
    );
    if let Some(bar) = window.as_ref().and_then(display::pagination_bar) {
        text.push('\n');
        text.push_str(&bar);
    }
    text
}

/// Controller starting at `page` with `search` and `filters` applied.
pub(crate) fn initial_controller<F: FilterSet, R: Record>(
    page_size: u32,
    page: u32,
    search: Option<&str>,
    filters: F,
) -> Result<ListController<F, R>> {
    let query = QueryDescriptor::new(page_size)?
        .with_page(page)?
        .with_search(search)
        .with_filters(filters);
    Ok(ListController::with_query(query))
}

/// Collect `--filter`-style options into a filter set.
pub(crate) fn filters_from<F: FilterSet>(pairs: &[(&str, Option<&str>)]) -> Result<F> {
    F::parse(
        pairs
            .iter()
            .filter_map(|(field, value)| value.map(|v| (*field, v))),
    )
}
