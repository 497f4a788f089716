use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use precis::config::Config;
use precis::notes::NotesStore;
use precis::summarizer::Summary;
use precis::{SessionCommand, SessionView};
use precis_ipc::SubmitParams;
use tracing::warn;

#[derive(Default, Clone, Copy, PartialEq, Eq, Debug)]
pub enum AppMode {
    #[default]
    Normal,
    EditingText,
    EditingParam(ParamField),
    EditingNotes,
    ShowHelp,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ParamField {
    MinLength,
    MaxLength,
    NumBeams,
    ExtractiveK,
}

impl ParamField {
    pub const ALL: [ParamField; 4] = [
        ParamField::MinLength,
        ParamField::MaxLength,
        ParamField::NumBeams,
        ParamField::ExtractiveK,
    ];

    pub fn label(self) -> &'static str {
        match self {
            ParamField::MinLength => "min",
            ParamField::MaxLength => "max",
            ParamField::NumBeams => "beams",
            ParamField::ExtractiveK => "extractive k",
        }
    }
}

/// What the event loop should do after a key press.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Session(SessionCommand),
    /// Put the text on the system clipboard.
    Copy(String),
}

impl From<SessionCommand> for Action {
    fn from(command: SessionCommand) -> Self {
        Action::Session(command)
    }
}

pub struct App {
    pub mode: AppMode,
    pub form: SubmitParams,
    pub notes: String,
    pub view: SessionView,
    pub config: Config,
    pub should_quit: bool,
    notes_store: Option<NotesStore>,
    notes_dirty: bool,
}

impl App {
    pub fn new(config: Config, view: SessionView, notes_store: Option<NotesStore>) -> Self {
        let notes = notes_store
            .as_ref()
            .and_then(|store| match store.get() {
                Ok(notes) => notes,
                Err(e) => {
                    warn!(error = %e, "Could not load notes");
                    None
                }
            })
            .unwrap_or_default();
        Self {
            mode: AppMode::Normal,
            form: config.default_params(),
            notes,
            view,
            config,
            should_quit: false,
            notes_store,
            notes_dirty: false,
        }
    }

    pub fn param(&self, field: ParamField) -> &str {
        match field {
            ParamField::MinLength => &self.form.min_length,
            ParamField::MaxLength => &self.form.max_length,
            ParamField::NumBeams => &self.form.num_beams,
            ParamField::ExtractiveK => &self.form.extractive_k,
        }
    }

    fn param_mut(&mut self, field: ParamField) -> &mut String {
        match field {
            ParamField::MinLength => &mut self.form.min_length,
            ParamField::MaxLength => &mut self.form.max_length,
            ParamField::NumBeams => &mut self.form.num_beams,
            ParamField::ExtractiveK => &mut self.form.extractive_k,
        }
    }

    /// Apply a key press. Returns the action it maps to, if any.
    pub fn on_key(&mut self, key: KeyEvent) -> Option<Action> {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        if ctrl && matches!(key.code, KeyCode::Enter | KeyCode::Char('s')) {
            return Some(self.submit_command().into());
        }

        match self.mode {
            AppMode::Normal => self.on_normal_key(key.code),
            AppMode::EditingText => {
                match key.code {
                    KeyCode::Esc => self.mode = AppMode::Normal,
                    KeyCode::Enter => self.form.text.push('\n'),
                    KeyCode::Tab => self.form.text.push('\t'),
                    KeyCode::Backspace => {
                        self.form.text.pop();
                    }
                    KeyCode::Char(c) => self.form.text.push(c),
                    _ => {}
                }
                None
            }
            AppMode::EditingParam(field) => {
                match key.code {
                    KeyCode::Esc | KeyCode::Enter => self.mode = AppMode::Normal,
                    KeyCode::Tab => {
                        let next = ParamField::ALL
                            .iter()
                            .position(|f| *f == field)
                            .map(|i| ParamField::ALL[(i + 1) % ParamField::ALL.len()])
                            .unwrap_or(field);
                        self.mode = AppMode::EditingParam(next);
                    }
                    KeyCode::Backspace => {
                        self.param_mut(field).pop();
                    }
                    KeyCode::Char(c) if c.is_ascii_digit() => self.param_mut(field).push(c),
                    _ => {}
                }
                None
            }
            AppMode::EditingNotes => {
                match key.code {
                    KeyCode::Esc => {
                        self.save_notes();
                        self.mode = AppMode::Normal;
                    }
                    KeyCode::Enter => self.edit_notes(|notes| notes.push('\n')),
                    KeyCode::Backspace => self.edit_notes(|notes| {
                        notes.pop();
                    }),
                    KeyCode::Char(c) => self.edit_notes(|notes| notes.push(c)),
                    _ => {}
                }
                None
            }
            AppMode::ShowHelp => {
                self.mode = AppMode::Normal;
                None
            }
        }
    }

    fn on_normal_key(&mut self, code: KeyCode) -> Option<Action> {
        let command = match code {
            KeyCode::Char('q') => {
                self.save_notes();
                self.should_quit = true;
                None
            }
            KeyCode::Char('i') | KeyCode::Char('e') => {
                self.mode = AppMode::EditingText;
                None
            }
            KeyCode::Char('m') => {
                self.mode = AppMode::EditingNotes;
                None
            }
            KeyCode::Char('?') => {
                self.mode = AppMode::ShowHelp;
                None
            }
            KeyCode::Char(c @ '1'..='4') => {
                let index = c.to_digit(10).unwrap_or(1) as usize;
                if let Some(field) = ParamField::ALL.get(index.saturating_sub(1)) {
                    self.mode = AppMode::EditingParam(*field);
                }
                None
            }
            KeyCode::Char('y') => return self.copy_summary(|s| s.abstractive.as_str()),
            KeyCode::Char('Y') => return self.copy_summary(|s| s.extractive.as_str()),
            KeyCode::Char('s') => Some(self.submit_command()),
            KeyCode::Char('c') => {
                self.form.text.clear();
                Some(SessionCommand::ClearRequest)
            }
            KeyCode::Char(' ') => Some(if self.view.timer.running {
                SessionCommand::Pause
            } else {
                SessionCommand::Start
            }),
            KeyCode::Char('r') => Some(SessionCommand::ResetTimer),
            KeyCode::Char('n') => Some(SessionCommand::Skip),
            KeyCode::Char('x') => Some(SessionCommand::Dismiss),
            KeyCode::Char('f') => Some(SessionCommand::SetFocusAlerts(!self.view.focus.enabled)),
            KeyCode::Char('C') => {
                self.notes.clear();
                self.notes_dirty = false;
                if let Some(store) = &self.notes_store {
                    if let Err(e) = store.remove() {
                        warn!(error = %e, "Could not clear notes");
                    }
                }
                None
            }
            _ => None,
        };
        command.map(Action::Session)
    }

    fn submit_command(&self) -> SessionCommand {
        SessionCommand::Submit(self.form.clone())
    }

    /// Nothing to copy until a summary with text is shown.
    fn copy_summary(&self, pick: fn(&Summary) -> &str) -> Option<Action> {
        self.view
            .summary
            .as_ref()
            .map(pick)
            .filter(|text| !text.is_empty())
            .map(|text| Action::Copy(text.to_string()))
    }

    fn edit_notes(&mut self, edit: impl FnOnce(&mut String)) {
        edit(&mut self.notes);
        self.notes_dirty = true;
    }

    pub fn save_notes(&mut self) {
        if !self.notes_dirty {
            return;
        }
        if let Some(store) = &self.notes_store {
            if let Err(e) = store.set(&self.notes) {
                warn!(error = %e, "Could not save notes");
                return;
            }
        }
        self.notes_dirty = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use precis::request::RequestOrchestrator;
    use precis_ipc::{FocusStatus, Phase, RequestState, TimerStatus};
    use tempfile::TempDir;

    fn view() -> SessionView {
        SessionView {
            timer: TimerStatus {
                phase: Phase::Work,
                remaining: 1500,
                total: 1500,
                running: false,
            },
            progress: 0.0,
            work_secs: 1500,
            break_secs: 300,
            request_state: RequestOrchestrator::new().state(),
            request_id: None,
            params: None,
            summary: None,
            error: None,
            discarded_responses: 0,
            focus: FocusStatus {
                enabled: true,
                away_count: 0,
                banner_visible: false,
            },
            last_away_at: None,
        }
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn type_text(app: &mut App, text: &str) {
        for c in text.chars() {
            app.on_key(key(KeyCode::Char(c)));
        }
    }

    #[test]
    fn form_starts_with_configured_defaults() {
        let app = App::new(Config::default(), view(), None);
        assert_eq!(app.param(ParamField::MaxLength), "160");
        assert_eq!(app.view.request_state, RequestState::Idle);
    }

    #[test]
    fn typing_then_submit_sends_the_form() {
        let mut app = App::new(Config::default(), view(), None);
        app.on_key(key(KeyCode::Char('i')));
        type_text(&mut app, "s and q are text here");
        app.on_key(key(KeyCode::Esc));

        match app.on_key(key(KeyCode::Char('s'))) {
            Some(Action::Session(SessionCommand::Submit(params))) => {
                assert_eq!(params.text, "s and q are text here");
                assert_eq!(params.min_length, "40");
            }
            other => panic!("expected submit, got {other:?}"),
        }
        assert!(!app.should_quit);
    }

    #[test]
    fn ctrl_s_submits_from_the_editor() {
        let mut app = App::new(Config::default(), view(), None);
        app.on_key(key(KeyCode::Char('i')));
        let cmd = app.on_key(KeyEvent::new(KeyCode::Char('s'), KeyModifiers::CONTROL));
        assert!(matches!(cmd, Some(Action::Session(SessionCommand::Submit(_)))));
        assert_eq!(app.mode, AppMode::EditingText);
    }

    #[test]
    fn param_fields_accept_digits_only() {
        let mut app = App::new(Config::default(), view(), None);
        app.on_key(key(KeyCode::Char('3')));
        assert_eq!(app.mode, AppMode::EditingParam(ParamField::NumBeams));
        app.on_key(key(KeyCode::Backspace));
        type_text(&mut app, "a8");
        app.on_key(key(KeyCode::Tab));
        assert_eq!(app.mode, AppMode::EditingParam(ParamField::ExtractiveK));
        app.on_key(key(KeyCode::Enter));
        assert_eq!(app.param(ParamField::NumBeams), "8");
        assert_eq!(app.mode, AppMode::Normal);
    }

    #[test]
    fn space_toggles_between_start_and_pause() {
        let mut app = App::new(Config::default(), view(), None);
        assert_eq!(
            app.on_key(key(KeyCode::Char(' '))),
            Some(Action::Session(SessionCommand::Start))
        );
        app.view.timer.running = true;
        assert_eq!(
            app.on_key(key(KeyCode::Char(' '))),
            Some(Action::Session(SessionCommand::Pause))
        );
    }

    #[test]
    fn y_copies_the_shown_summaries() {
        let mut app = App::new(Config::default(), view(), None);
        assert_eq!(app.on_key(key(KeyCode::Char('y'))), None);

        app.view.summary = Some(Summary {
            abstractive: "short version".into(),
            extractive: "First sentence. Second sentence.".into(),
            ..Summary::default()
        });
        assert_eq!(
            app.on_key(key(KeyCode::Char('y'))),
            Some(Action::Copy("short version".into()))
        );
        assert_eq!(
            app.on_key(key(KeyCode::Char('Y'))),
            Some(Action::Copy("First sentence. Second sentence.".into()))
        );

        app.view.summary = Some(Summary {
            extractive: "only extractive".into(),
            ..Summary::default()
        });
        assert_eq!(app.on_key(key(KeyCode::Char('y'))), None);
    }

    #[test]
    fn notes_are_saved_when_leaving_the_editor() {
        let dir = TempDir::new().unwrap();
        let store = NotesStore::at(dir.path().join("notes.json"));
        let mut app = App::new(Config::default(), view(), Some(store.clone()));

        app.on_key(key(KeyCode::Char('m')));
        type_text(&mut app, "todo");
        assert_eq!(store.get().unwrap(), None);
        app.on_key(key(KeyCode::Esc));
        assert_eq!(store.get().unwrap().as_deref(), Some("todo"));

        let reopened = App::new(Config::default(), view(), Some(store));
        assert_eq!(reopened.notes, "todo");
    }
}
