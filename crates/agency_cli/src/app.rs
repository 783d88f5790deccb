use std::path::Path;
use std::sync::Arc;

use agency_desk::{
    load_document, Agency, ConversationEngine, IgnoreReason, IngestOutcome, PipelineGateway,
    RunOutcome, Selection, Session, TranscriptEntry, FILE_INGESTED, UPLOAD_FAILED,
};
use tracing::debug;

use crate::commands::{parse_slash_command, SlashCommand};

/// Something the view should print.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Info(String),
    Error(String),
    Entry(TranscriptEntry),
    /// A run is pending.
    Thinking,
}

pub trait ViewOps {
    fn show(&mut self, notice: Notice);
    fn clear_screen(&mut self);
    fn request_stop(&mut self);
}

pub const HELP_TEXT: &str = "Commands:
  /login <username> <password>   sign in
  /logout                        sign out
  /whoami                        show the signed-in account
  /agency [legal|design]         show or switch the agency
  /attach <path>                 choose a document to ingest (Legal)
  /ingest                        upload the chosen document (Legal)
  /status                        check the pipeline service
  /clear                         clear the screen
  /quit                          exit
End a line with \\ to continue the prompt on the next line.";

const SIGN_IN_FIRST: &str = "Sign in first: /login <username> <password>";
const SELECT_AGENCY_FIRST: &str = "Select an agency first: /agency legal|design";
const REQUEST_RUNNING: &str = "A request is already running.";
const LEGAL_ONLY: &str = "Document ingestion is available in the Legal workspace only.";
const CONTINUATION: char = '\\';

pub struct App {
    session: Session,
    engine: Arc<ConversationEngine>,
    pipeline: Arc<dyn PipelineGateway>,
    draft: Vec<String>,
    pub should_exit: bool,
}

impl App {
    pub fn new(
        session: Session,
        engine: Arc<ConversationEngine>,
        pipeline: Arc<dyn PipelineGateway>,
    ) -> Self {
        Self {
            session,
            engine,
            pipeline,
            draft: Vec::new(),
            should_exit: false,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn engine(&self) -> &ConversationEngine {
        &self.engine
    }

    /// Input prompt for the next line.
    pub fn prompt_label(&self) -> String {
        if !self.draft.is_empty() {
            return "... ".to_string();
        }
        if !self.session.is_authenticated() {
            return "login> ".to_string();
        }
        match self.engine.selected_agency() {
            Some(agency) => format!("{agency}> "),
            None => "> ".to_string(),
        }
    }

    /// Print the greeting that matches the restored session.
    pub fn on_start(&mut self, view: &mut dyn ViewOps) {
        match self.session.identity() {
            Some(identity) => view.show(Notice::Info(format!(
                "Welcome back, {}. {}",
                identity.email,
                self.agency_hint()
            ))),
            None => view.show(Notice::Info(SIGN_IN_FIRST.to_string())),
        }
    }

    pub async fn on_line(&mut self, line: &str, view: &mut dyn ViewOps) {
        if let Some(partial) = line.strip_suffix(CONTINUATION) {
            self.draft.push(partial.to_string());
            return;
        }

        if !self.draft.is_empty() {
            let mut lines = std::mem::take(&mut self.draft);
            lines.push(line.to_string());
            self.submit_prompt(&lines.join("\n"), view).await;
            return;
        }

        match parse_slash_command(line) {
            Some(command) => self.on_command(command, view).await,
            None => self.submit_prompt(line, view).await,
        }
    }

    async fn on_command(&mut self, command: SlashCommand, view: &mut dyn ViewOps) {
        if !self.session.is_authenticated() && !command.allowed_signed_out() {
            view.show(Notice::Error(SIGN_IN_FIRST.to_string()));
            return;
        }

        match command {
            SlashCommand::Help => view.show(Notice::Info(HELP_TEXT.to_string())),
            SlashCommand::Login { username, password } => {
                self.on_login(&username, &password, view).await;
            }
            SlashCommand::Logout => {
                self.session.logout();
                self.engine.reset();
                self.draft.clear();
                view.show(Notice::Info("Signed out.".to_string()));
            }
            SlashCommand::WhoAmI => self.on_whoami(view),
            SlashCommand::Agency(None) => {
                let text = match self.engine.selected_agency() {
                    Some(agency) => format!("Current agency: {}", agency.label()),
                    None => SELECT_AGENCY_FIRST.to_string(),
                };
                view.show(Notice::Info(text));
            }
            SlashCommand::Agency(Some(name)) => self.on_select_agency(&name, view),
            SlashCommand::Attach(path) => self.on_attach(Path::new(&path), view).await,
            SlashCommand::Ingest => self.on_ingest(view).await,
            SlashCommand::Status => match self.pipeline.health().await {
                Ok(health) if health.is_ok() => {
                    view.show(Notice::Info("Pipeline service: ok".to_string()));
                }
                Ok(health) => view.show(Notice::Error(format!(
                    "Pipeline service: {}",
                    health.status
                ))),
                Err(error) => view.show(Notice::Error(format!(
                    "Pipeline service unreachable: {error}"
                ))),
            },
            SlashCommand::Clear => view.clear_screen(),
            SlashCommand::Quit => {
                self.should_exit = true;
                view.request_stop();
            }
            SlashCommand::Unknown(command) => {
                view.show(Notice::Error(format!("Unknown command: {command}")));
            }
            SlashCommand::Invalid { usage } => {
                view.show(Notice::Error(format!("Usage: {usage}")));
            }
        }
    }

    async fn on_login(&mut self, username: &str, password: &str, view: &mut dyn ViewOps) {
        match self.session.login(username, password).await {
            Ok(navigation) => {
                debug!(?navigation, "login finished");
                let (email, verified) = match self.session.user() {
                    Some(user) => (user.identity.email.clone(), user.verified),
                    None => (username.to_string(), false),
                };
                let suffix = if verified { "" } else { " (identity not verified)" };
                view.show(Notice::Info(format!(
                    "Signed in as {email}{suffix}. {}",
                    self.agency_hint()
                )));
            }
            Err(error) => view.show(Notice::Error(format!("Login failed: {error}"))),
        }
    }

    fn on_whoami(&self, view: &mut dyn ViewOps) {
        let Some(user) = self.session.user() else {
            view.show(Notice::Error(SIGN_IN_FIRST.to_string()));
            return;
        };
        let identity = &user.identity;
        let mut text = format!("{} (id {})", identity.email, identity.id);
        if identity.is_superuser {
            text.push_str(", superuser");
        }
        if !identity.is_active {
            text.push_str(", inactive");
        }
        if !user.verified {
            text.push_str(", not verified");
        }
        view.show(Notice::Info(text));
    }

    fn on_select_agency(&mut self, name: &str, view: &mut dyn ViewOps) {
        let agency = match name.parse::<Agency>() {
            Ok(agency) => agency,
            Err(error) => {
                view.show(Notice::Error(error.to_string()));
                return;
            }
        };

        let text = match self.engine.select_agency(agency) {
            Selection::Unchanged => format!("{} is already selected.", agency.label()),
            Selection::Switched { .. } => {
                format!("Switched to {}. New conversation started.", agency.label())
            }
        };
        view.show(Notice::Info(text));
    }

    async fn on_attach(&mut self, path: &Path, view: &mut dyn ViewOps) {
        if !self.in_legal_workspace(view) {
            return;
        }
        match load_document(path).await {
            Ok(upload) => {
                let text = format!(
                    "Attached {} ({} bytes). Use /ingest to upload it.",
                    upload.file_name,
                    upload.len()
                );
                self.engine.attach_document(upload);
                view.show(Notice::Info(text));
            }
            Err(error) => view.show(Notice::Error(error.to_string())),
        }
    }

    async fn on_ingest(&mut self, view: &mut dyn ViewOps) {
        if !self.in_legal_workspace(view) {
            return;
        }
        match self.engine.ingest_pending().await {
            IngestOutcome::Ingested { .. } => view.show(Notice::Info(FILE_INGESTED.to_string())),
            IngestOutcome::Failed { .. } => view.show(Notice::Error(UPLOAD_FAILED.to_string())),
            IngestOutcome::NoDocument => view.show(Notice::Error(
                "No document attached. Use /attach <path> first.".to_string(),
            )),
        }
    }

    async fn submit_prompt(&mut self, prompt: &str, view: &mut dyn ViewOps) {
        if prompt.trim().is_empty() {
            return;
        }
        if !self.session.is_authenticated() {
            view.show(Notice::Error(SIGN_IN_FIRST.to_string()));
            return;
        }
        if self.engine.selected_agency().is_none() {
            view.show(Notice::Error(SELECT_AGENCY_FIRST.to_string()));
            return;
        }

        if self.engine.is_running() {
            view.show(Notice::Error(REQUEST_RUNNING.to_string()));
            return;
        }

        view.show(Notice::Thinking);
        match self.engine.run_agency(prompt).await {
            RunOutcome::Answered(entry) => view.show(Notice::Entry(entry)),
            RunOutcome::Ignored(IgnoreReason::Busy) => {
                view.show(Notice::Error(REQUEST_RUNNING.to_string()));
            }
            RunOutcome::Ignored(reason) => debug!(?reason, "prompt ignored"),
            RunOutcome::Stale => debug!("reply arrived after the agency changed"),
        }
    }

    fn in_legal_workspace(&self, view: &mut dyn ViewOps) -> bool {
        if self.engine.selected_agency() == Some(Agency::Legal) {
            return true;
        }
        view.show(Notice::Error(LEGAL_ONLY.to_string()));
        false
    }

    fn agency_hint(&self) -> String {
        match self.engine.selected_agency() {
            Some(agency) => format!("Working with the {}.", agency.label()),
            None => SELECT_AGENCY_FIRST.to_string(),
        }
    }
}
