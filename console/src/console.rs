//! The admin console: every user-facing operation, wired from the core's
//! request builders through a `Transport` and rendered to a writer.
//!
//! Protected operations go through a route guard: without a stored token
//! they fail before any request is sent, and a 401 from the server drops the
//! token so the next command asks for a fresh login.

use std::fs;
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context, Result};
use estate_core::auth::{complete_auth, login_error_message, register_error_message};
use estate_core::error::GENERIC_ERROR_MESSAGE;
use estate_core::listing::FetchOutcome;
use estate_core::session::restore;
use estate_core::{
    ApiClient, ApiError, AssetUrls, FileUpload, FormError, HttpRequest, HttpResponse,
    ListingController, LoginForm, PendingFetch, PropertyDetail, PropertyFields, PropertyForm,
    PropertyId, QueryAction, QueryState, RegisterForm, TokenStore,
};
use tracing::{debug, info, warn};

use crate::render;
use crate::repl::{self, BrowseCommand};
use crate::transport::Transport;

const LOGIN_HINT: &str = "not logged in; run `estate-admin login` first";

/// Field edits for `edit`; `None` leaves the loaded value alone.
#[derive(Debug, Clone, Default)]
pub struct FieldChanges {
    pub title: Option<String>,
    pub property_type: Option<estate_core::PropertyType>,
    pub status: Option<estate_core::PropertyStatus>,
    pub price: Option<String>,
    pub area: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub district: Option<String>,
    pub contact_name: Option<String>,
    pub contact_phone: Option<String>,
}

impl FieldChanges {
    fn apply(self, fields: &mut PropertyFields) {
        macro_rules! set {
            ($($name:ident),+) => {
                $(if let Some(value) = self.$name {
                    fields.$name = value;
                })+
            };
        }
        set!(title, status, price, area, address, city, district, contact_name, contact_phone);
        if let Some(property_type) = self.property_type {
            fields.property_type = Some(property_type);
        }
    }
}

pub struct Console<T, S> {
    client: ApiClient,
    assets: AssetUrls,
    transport: T,
    store: S,
}

impl<T: Transport, S: TokenStore> Console<T, S> {
    /// Build a console whose session is restored from `store`.
    pub fn new(api_base_url: &str, asset_base_url: &str, transport: T, store: S) -> Result<Self> {
        let session = restore(&store).context("failed to read the stored session")?;
        Ok(Self {
            client: ApiClient::new(api_base_url, session),
            assets: AssetUrls::new(asset_base_url),
            transport,
            store,
        })
    }

    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    fn send(&self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
        self.transport.execute(request)
    }

    fn guard(&self) -> Result<()> {
        self.client.session().require().map_err(|_| anyhow!(LOGIN_HINT))
    }

    /// Drop the session after the server rejected the token.
    fn expire(&mut self) -> Result<()> {
        warn!("server rejected the session token");
        self.client.clear_token();
        self.store.clear().context("failed to clear the stored session")
    }

    /// Turn an API error into the console error, expiring the session on 401.
    fn fail(&mut self, err: ApiError) -> anyhow::Error {
        if err.is_unauthorized() {
            if let Err(e) = self.expire() {
                return e;
            }
            return anyhow!("session expired; run `estate-admin login` again");
        }
        anyhow!(err.display_message(GENERIC_ERROR_MESSAGE))
    }

    pub fn login(&mut self, out: &mut impl Write, email: &str, password: &str) -> Result<()> {
        let request = LoginForm::new(email, password)
            .build_submit(&self.client)
            .map_err(|e| invalid(out, e))?;
        let result = self.send(request);
        let token = complete_auth(&mut self.client, result).map_err(|e| anyhow!(login_error_message(&e)))?;
        self.store.save(&token.token).context("failed to store the session")?;
        info!(email, "logged in");
        writeln!(out, "Logged in as {email}.")?;
        Ok(())
    }

    pub fn register(&mut self, out: &mut impl Write, form: RegisterForm) -> Result<()> {
        let request = form.build_submit(&self.client).map_err(|e| invalid(out, e))?;
        let result = self.send(request);
        let token = complete_auth(&mut self.client, result).map_err(|e| anyhow!(register_error_message(&e)))?;
        self.store.save(&token.token).context("failed to store the session")?;
        info!(email = %form.email, "registered");
        writeln!(out, "Account created for {}.", form.email)?;
        Ok(())
    }

    pub fn logout(&mut self, out: &mut impl Write) -> Result<()> {
        self.client.clear_token();
        self.store.clear().context("failed to clear the stored session")?;
        writeln!(out, "Logged out.")?;
        Ok(())
    }

    /// Fetch one page for `query` and print it.
    pub fn list(&mut self, out: &mut impl Write, query: QueryState) -> Result<()> {
        self.guard()?;
        let mut listing = ListingController::with_query(query);
        let pending = listing.mount(&self.client);
        self.run_fetch(&mut listing, pending)?;
        render::listing(out, &listing)?;
        Ok(())
    }

    /// Interactive listing: one command per input line until `quit` or EOF.
    pub fn browse(&mut self, out: &mut impl Write, input: &mut impl BufRead) -> Result<()> {
        self.guard()?;
        let mut listing = ListingController::new();
        let pending = listing.mount(&self.client);
        self.run_fetch(&mut listing, pending)?;
        render::listing(out, &listing)?;

        loop {
            write!(out, "> ")?;
            out.flush()?;
            let mut line = String::new();
            if input.read_line(&mut line)? == 0 {
                return Ok(());
            }
            let command = match repl::parse(&line) {
                Ok(command) => command,
                Err(message) => {
                    writeln!(out, "{message}")?;
                    continue;
                }
            };

            match command {
                BrowseCommand::Quit => return Ok(()),
                BrowseCommand::Help => {
                    writeln!(out, "{}", repl::HELP)?;
                    continue;
                }
                BrowseCommand::Show(id) => {
                    match self.fetch_detail(id) {
                        Ok(detail) => render::detail(out, &detail, &self.assets)?,
                        Err(err) if !self.client.session().is_authenticated() => return Err(err),
                        Err(err) => writeln!(out, "error: {err}")?,
                    }
                    continue;
                }
                BrowseCommand::Query(action) => {
                    let pending = listing.dispatch(&self.client, action);
                    self.run_fetch(&mut listing, pending)?;
                }
                BrowseCommand::Refresh => {
                    let pending = listing.refresh(&self.client);
                    self.run_fetch(&mut listing, pending)?;
                }
                BrowseCommand::Delete(id) => {
                    let pending = {
                        let mut ask = |prompt: &str| ask_yes_no(&mut *out, &mut *input, prompt);
                        listing.request_delete(&self.client, id, &mut ask)
                    };
                    let Some(pending) = pending else {
                        writeln!(out, "Cancelled.")?;
                        continue;
                    };
                    let result = self.send(pending.request.clone());
                    match listing.complete_delete(&self.client, pending, result) {
                        Ok(refresh) => {
                            writeln!(out, "Deleted property {id}.")?;
                            self.run_fetch(&mut listing, refresh)?;
                        }
                        Err(err) if err.is_unauthorized() => return Err(self.fail(err)),
                        Err(_) => {}
                    }
                }
            }
            render::listing(out, &listing)?;
        }
    }

    /// Execute a listing fetch. Failures stay on the listing as its error
    /// message; only a rejected token ends the command.
    fn run_fetch(&mut self, listing: &mut ListingController, pending: PendingFetch) -> Result<()> {
        let result = self.send(pending.request);
        match listing.complete(&self.client, pending.seq, result) {
            FetchOutcome::Failed(err) if err.is_unauthorized() => Err(self.fail(err)),
            FetchOutcome::Failed(err) => {
                debug!(error = %err, "listing shows an error");
                Ok(())
            }
            FetchOutcome::Applied | FetchOutcome::Stale => Ok(()),
        }
    }

    fn fetch_detail(&mut self, id: PropertyId) -> Result<PropertyDetail> {
        let request = self.client.build_get_property(id);
        let result = self.send(request);
        match result.and_then(|response| self.client.parse_get_property(response)) {
            Ok(detail) => Ok(detail),
            Err(ApiError::NotFound) => bail!("property {id} not found"),
            Err(err) => Err(self.fail(err)),
        }
    }

    pub fn show(&mut self, out: &mut impl Write, id: PropertyId) -> Result<()> {
        self.guard()?;
        let detail = self.fetch_detail(id)?;
        render::detail(out, &detail, &self.assets)?;
        Ok(())
    }

    pub fn create(&mut self, out: &mut impl Write, fields: PropertyFields, images: &[PathBuf]) -> Result<()> {
        self.guard()?;
        let mut form = PropertyForm::create();
        form.fields = fields;
        form.attach_files(read_uploads(images)?);
        let saved = self.submit(out, &mut form)?;
        writeln!(out, "Created property {} \"{}\".", saved.0, saved.1)?;
        Ok(())
    }

    /// Load a record, apply changes, drop the gallery tiles at `remove`
    /// (indices as printed before any removal), attach new files and save.
    pub fn edit(
        &mut self,
        out: &mut impl Write,
        id: PropertyId,
        changes: FieldChanges,
        remove: &[usize],
        images: &[PathBuf],
    ) -> Result<()> {
        self.guard()?;
        let mut form = PropertyForm::edit(id);
        let detail = self.fetch_detail(id)?;
        form.apply_loaded(detail);
        changes.apply(&mut form.fields);

        let mut remove = remove.to_vec();
        remove.sort_unstable();
        remove.dedup();
        for index in remove.into_iter().rev() {
            form.remove_preview(index);
        }
        form.attach_files(read_uploads(images)?);

        writeln!(out, "Images after edit:")?;
        render::previews(out, &form, &self.assets)?;
        let saved = self.submit(out, &mut form)?;
        writeln!(out, "Saved property {} \"{}\".", saved.0, saved.1)?;
        Ok(())
    }

    fn submit(&mut self, out: &mut impl Write, form: &mut PropertyForm) -> Result<(PropertyId, String)> {
        let request = form.build_submit(&self.client).map_err(|e| invalid(out, e))?;
        let result = self.send(request);
        match form.complete_submit(&self.client, result) {
            Ok(property) => Ok((property.id, property.title)),
            Err(err) if err.is_unauthorized() => Err(self.fail(err)),
            Err(err) => {
                if let ApiError::Validation { errors, .. } = &err {
                    for (field, messages) in errors {
                        writeln!(out, "  {field}: {}", messages.join(" "))?;
                    }
                }
                let message = form.server_error().unwrap_or(GENERIC_ERROR_MESSAGE);
                bail!("{message}")
            }
        }
    }

    /// Delete after confirmation; `assume_yes` skips the prompt.
    pub fn delete(
        &mut self,
        out: &mut impl Write,
        input: &mut impl BufRead,
        id: PropertyId,
        assume_yes: bool,
    ) -> Result<()> {
        self.guard()?;
        let mut listing = ListingController::new();
        let pending = if assume_yes {
            listing.request_delete(&self.client, id, &mut |_: &str| true)
        } else {
            let mut ask = |prompt: &str| ask_yes_no(&mut *out, &mut *input, prompt);
            listing.request_delete(&self.client, id, &mut ask)
        };
        let Some(pending) = pending else {
            writeln!(out, "Cancelled.")?;
            return Ok(());
        };
        let result = self.send(pending.request.clone());
        // One-shot command: no table is shown afterwards, so the returned
        // refresh is not sent.
        match listing.complete_delete(&self.client, pending, result) {
            Ok(_refresh) => {
                writeln!(out, "Deleted property {id}.")?;
                Ok(())
            }
            Err(ApiError::NotFound) => bail!("property {id} not found"),
            Err(err) => Err(self.fail(err)),
        }
    }
}

/// Print field errors and turn the form error into the command's error.
fn invalid(out: &mut impl Write, err: FormError) -> anyhow::Error {
    match err {
        FormError::Invalid(fields) => {
            let written = writeln!(out, "Please fix the following:")
                .and_then(|_| render::field_errors(out, &fields));
            match written {
                Ok(()) => anyhow!("invalid input"),
                Err(e) => e.into(),
            }
        }
        FormError::Api(err) => err.into(),
    }
}

/// Prompt on `out` and read one answer line; anything but y/yes declines.
fn ask_yes_no(out: &mut impl Write, input: &mut impl BufRead, prompt: &str) -> bool {
    if write!(out, "{prompt} [y/N] ").and_then(|_| out.flush()).is_err() {
        return false;
    }
    let mut answer = String::new();
    match input.read_line(&mut answer) {
        Ok(_) => matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes"),
        Err(_) => false,
    }
}

/// Read image files from disk for upload.
pub fn read_uploads(paths: &[PathBuf]) -> Result<Vec<FileUpload>> {
    paths
        .iter()
        .map(|path| {
            let bytes = fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
            let file_name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| "upload".to_string());
            Ok(FileUpload::new(file_name, content_type_for(path), bytes))
        })
        .collect()
}

fn content_type_for(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "svg" => "image/svg+xml",
        _ => "application/octet-stream",
    }
}

/// Fold listing flags into a query, filters first so a requested page is
/// not reset by them.
pub fn query_from(actions: impl IntoIterator<Item = QueryAction>) -> QueryState {
    actions
        .into_iter()
        .fold(QueryState::default(), |state, action| state.apply(action, None))
}
