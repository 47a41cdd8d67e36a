//! # Conversation Router
//!
//! The state machine that maps (session, inbound message) to a session
//! mutation plus an ordered list of outbound [`Reply`] values.
//!
//! The router is pure: it never touches the transport, the clock, or a
//! logger. Legality of a command in a state is a single data-driven check
//! ([`command_allowed`]) rather than per-handler conditionals, so every
//! (state, command) pair is testable in isolation. Illegal input comes back
//! as a [`ChatError`] and the caller renders `user_message()`; the session
//! is left untouched except for the documented recovery point after a decode
//! failure.

use crate::codec::Encoding;
use crate::error::ChatError;
use crate::query;
use crate::record::Record;
use crate::session::{ChatState, Session};

// =============================================================================
// COMMAND SURFACE
// =============================================================================

/// The recognized text commands, matched verbatim and case-sensitively.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Start,
    Help,
    UploadFile,
    Select,
    Sort,
    Download,
    AdmArea,
    WiFiName,
    FunctionFlagAndAccessFlag,
    LibraryName,
    CoverageArea,
    Csv,
    Json,
}

impl Command {
    /// Parse a single `;`-free token. Anything else is free text.
    #[must_use]
    pub fn parse(token: &str) -> Option<Self> {
        match token {
            "/start" => Some(Self::Start),
            "/help" => Some(Self::Help),
            "/uploadFile" => Some(Self::UploadFile),
            "/select" => Some(Self::Select),
            "/sort" => Some(Self::Sort),
            "/download" => Some(Self::Download),
            "/AdmArea" => Some(Self::AdmArea),
            "/WiFiName" => Some(Self::WiFiName),
            "/FunctionFlagAndAccessFlag" => Some(Self::FunctionFlagAndAccessFlag),
            "/LibraryName" => Some(Self::LibraryName),
            "/CoverageArea" => Some(Self::CoverageArea),
            "/CSV" => Some(Self::Csv),
            "/JSON" => Some(Self::Json),
            _ => None,
        }
    }

    /// The query-engine field this command selects, if any.
    #[must_use]
    pub fn field_name(self) -> Option<&'static str> {
        match self {
            Self::AdmArea => Some(query::FILTER_ADM_AREA),
            Self::WiFiName => Some(query::FILTER_WIFI_NAME),
            Self::FunctionFlagAndAccessFlag => Some(query::FILTER_FLAGS),
            Self::LibraryName => Some(query::SORT_LIBRARY_NAME),
            Self::CoverageArea => Some(query::SORT_COVERAGE_AREA),
            _ => None,
        }
    }
}

// =============================================================================
// REPLIES
// =============================================================================

/// Rows of reply-keyboard button labels offered alongside a text reply.
pub type Keyboard = &'static [&'static [&'static str]];

/// An outbound message the caller must deliver, in order.
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    Text {
        text: String,
        keyboard: Option<Keyboard>,
    },
    Document {
        encoding: Encoding,
        bytes: Vec<u8>,
    },
}

impl Reply {
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text {
            text: text.into(),
            keyboard: None,
        }
    }

    #[must_use]
    pub fn with_keyboard(text: impl Into<String>, keyboard: Keyboard) -> Self {
        Self::Text {
            text: text.into(),
            keyboard: Some(keyboard),
        }
    }
}

// =============================================================================
// USER-FACING TEXTS & KEYBOARDS
// =============================================================================

pub const WELCOME: &str = "Welcome!\n\
    I am a bot that works with CSV and JSON files of the wifi-library dataset.\n\
    Upload a file with /uploadFile or list the available commands with /help.";

pub const HELP_TEXT: &str = "You can use the following commands:\n\
    /uploadFile - upload a CSV or JSON dataset file\n\
    /select - filter by a field in the file\n\
    /sort - sort by a field in the file\n\
    /download - download the processed file\n\
    /help - list the commands\n\
    /start - restart the bot";

pub const UPLOAD_PROMPT: &str = "Upload a CSV or JSON file.";

pub const FILE_STORED: &str = "The file has been uploaded, choose the next action.";

pub const SELECT_PROMPT: &str = "Choose the field to filter by.";

pub const SORT_PROMPT: &str = "Choose the field to sort by.\n\
    LibraryName - alphabetical\n\
    CoverageArea - descending";

pub const DOWNLOAD_PROMPT: &str = "Choose the download format.";

pub const RESULT_EMPTY: &str = "The result is empty.";

pub const FILTER_DONE: &str = "Selection completed successfully!\n\
    Use /download to download the processed file.";

pub const SORT_DONE: &str = "Sorting completed successfully!\n\
    Use /download to download the processed file.";

pub const PREPARING_DOWNLOAD: &str = "Preparing the file for download...";

pub const RESTART_HINT: &str = "Use /start to restart the bot.";

/// Sent by the app layer for updates that are neither text nor a document
/// expected right now.
pub const UNSUPPORTED_MESSAGE_TYPE: &str = "This kind of message cannot be processed. \
    If you are sending a file, use /uploadFile first.";

/// Caption attached to every download the bot sends.
pub const DOWNLOAD_CAPTION: &str = "Your file is ready to download";

/// File-name stem for downloads; the app appends a timestamp and extension.
pub const DOWNLOAD_FILE_STEM: &str = "wifi-library";

pub const START_KEYBOARD: Keyboard = &[&["/uploadFile"], &["/help"]];
pub const AFTER_UPLOAD_KEYBOARD: Keyboard = &[&["/select", "/sort"], &["/help"], &["/start"]];
pub const SELECT_KEYBOARD: Keyboard = &[
    &["/AdmArea", "/WiFiName"],
    &["/FunctionFlagAndAccessFlag"],
    &["/help"],
    &["/start"],
];
pub const SORT_KEYBOARD: Keyboard = &[&["/LibraryName"], &["/CoverageArea"], &["/help"], &["/start"]];
pub const AFTER_PROCESS_KEYBOARD: Keyboard = &[&["/download"], &["/help"], &["/start"]];
pub const DOWNLOAD_KEYBOARD: Keyboard = &[&["/CSV", "/JSON"], &["/help"], &["/start"]];

// =============================================================================
// ENTRY POINTS
// =============================================================================

/// Handle an inbound text message.
///
/// `/start` and `/help` cut through every state, including the value prompt;
/// in `AwaitingFieldValue` any other text is consumed as the `;`-separated
/// filter values.
pub fn handle_text(session: &mut Session, text: &str) -> Result<Vec<Reply>, ChatError> {
    let head = text.split(';').next().unwrap_or(text);
    match Command::parse(head) {
        Some(Command::Start) => Ok(handle_start(session)),
        Some(Command::Help) => Ok(vec![Reply::text(HELP_TEXT)]),
        parsed => {
            if session.state() == ChatState::AwaitingFieldValue {
                let values: Vec<&str> = text.split(';').collect();
                return run_filter(session, &values);
            }
            let Some(command) = parsed else {
                return Err(state_diagnostic(session.state(), text));
            };
            if !command_allowed(session, command) {
                return Err(state_diagnostic(session.state(), text));
            }
            dispatch(session, command)
        }
    }
}

/// Handle a document attachment that arrived while awaiting an upload.
///
/// The caller is expected to route documents here only in
/// `AwaitingFileUpload`; any other state is answered with a `State` error.
/// An unsupported suffix leaves the state unchanged.
pub fn handle_document(
    session: &mut Session,
    file_name: &str,
    bytes: Vec<u8>,
) -> Result<Vec<Reply>, ChatError> {
    if session.state() != ChatState::AwaitingFileUpload {
        return Err(ChatError::State {
            input: file_name.to_string(),
        });
    }
    let Some(encoding) = Encoding::from_file_name(file_name) else {
        return Err(ChatError::UnsupportedFile);
    };
    session.store_upload(bytes, encoding);
    session.set_state(ChatState::FileUploaded);
    Ok(vec![Reply::with_keyboard(FILE_STORED, AFTER_UPLOAD_KEYBOARD)])
}

// =============================================================================
// TRANSITION LEGALITY
// =============================================================================

/// The transition table: is `command` legal for this session right now?
fn command_allowed(session: &Session, command: Command) -> bool {
    use ChatState as S;
    use Command as C;

    if matches!(command, C::Start | C::Help) {
        return true;
    }
    // A download may begin anywhere a working set exists.
    if command == C::Download {
        return session.state() == S::ProcessingCompleted || session.working_set().is_some();
    }
    match session.state() {
        S::Initial | S::AwaitingFileUpload => matches!(command, C::UploadFile),
        S::FileUploaded => matches!(command, C::Select | C::Sort),
        S::AwaitingSelection => matches!(
            command,
            C::AdmArea | C::WiFiName | C::FunctionFlagAndAccessFlag
        ),
        S::AwaitingSorting => matches!(command, C::LibraryName | C::CoverageArea),
        S::AwaitingDownloading => matches!(command, C::Csv | C::Json),
        S::ProcessingCompleted | S::AwaitingFieldValue => false,
    }
}

/// Pick the most helpful diagnostic for input that was not honored.
fn state_diagnostic(state: ChatState, input: &str) -> ChatError {
    let head = input.split(';').next().unwrap_or(input);
    match (state, head) {
        (ChatState::FileUploaded, "/uploadFile") => ChatError::AlreadyUploaded,
        (
            ChatState::Initial | ChatState::AwaitingFileUpload,
            "/select" | "/sort" | "/download",
        ) => ChatError::UploadRequired,
        _ => ChatError::State {
            input: input.to_string(),
        },
    }
}

// =============================================================================
// HANDLERS
// =============================================================================

fn dispatch(session: &mut Session, command: Command) -> Result<Vec<Reply>, ChatError> {
    use Command as C;
    match command {
        C::UploadFile => {
            session.set_state(ChatState::AwaitingFileUpload);
            Ok(vec![Reply::text(UPLOAD_PROMPT)])
        }
        C::Select => {
            session.set_state(ChatState::AwaitingSelection);
            Ok(vec![Reply::with_keyboard(SELECT_PROMPT, SELECT_KEYBOARD)])
        }
        C::Sort => {
            session.set_state(ChatState::AwaitingSorting);
            Ok(vec![Reply::with_keyboard(SORT_PROMPT, SORT_KEYBOARD)])
        }
        C::Download => {
            session.set_state(ChatState::AwaitingDownloading);
            Ok(vec![Reply::with_keyboard(DOWNLOAD_PROMPT, DOWNLOAD_KEYBOARD)])
        }
        C::AdmArea | C::WiFiName | C::FunctionFlagAndAccessFlag => {
            Ok(pick_filter_field(session, command))
        }
        C::LibraryName | C::CoverageArea => run_sort(session, command),
        C::Csv => send_download(session, Encoding::Csv),
        C::Json => send_download(session, Encoding::Json),
        // Routed before dispatch; kept to make the match total.
        C::Start | C::Help => Ok(vec![]),
    }
}

fn handle_start(session: &mut Session) -> Vec<Reply> {
    session.reset();
    vec![Reply::with_keyboard(WELCOME, START_KEYBOARD)]
}

fn pick_filter_field(session: &mut Session, command: Command) -> Vec<Reply> {
    let Some(field) = command.field_name() else {
        return vec![];
    };
    session.set_state(ChatState::AwaitingFieldValue);
    session.set_field(field);
    vec![Reply::text(format!(
        "Enter the value of the {field} field for the selection.\n\
         If the selection uses two fields, separate the values with a \
         semicolon and no spaces.\n\
         Example: действует;открытая сеть"
    ))]
}

fn run_filter(session: &mut Session, values: &[&str]) -> Result<Vec<Reply>, ChatError> {
    let Some(field) = session.field() else {
        return Err(state_diagnostic(session.state(), &values.join(";")));
    };
    let records = decode_for_processing(session)?;
    let matched = query::filter(&records, field, values).unwrap_or_default();
    Ok(finish_processing(session, matched, FILTER_DONE))
}

fn run_sort(session: &mut Session, command: Command) -> Result<Vec<Reply>, ChatError> {
    let Some(field) = command.field_name() else {
        return Ok(vec![]);
    };
    let records = decode_for_processing(session)?;
    let sorted = query::sort(&records, field).unwrap_or_default();
    Ok(finish_processing(session, sorted, SORT_DONE))
}

/// Decode the stored upload; on a format failure move the session back to
/// its recovery point (`FileUploaded`, upload retained) before propagating.
fn decode_for_processing(session: &mut Session) -> Result<Vec<Record>, ChatError> {
    match session.decode_upload() {
        Ok(records) => Ok(records),
        Err(err) => {
            if matches!(err, ChatError::Format(_)) {
                session.set_state(ChatState::FileUploaded);
                session.clear_field();
            }
            Err(err)
        }
    }
}

fn finish_processing(session: &mut Session, outcome: Vec<Record>, done_text: &str) -> Vec<Reply> {
    let empty = outcome.is_empty();
    session.set_working_set(outcome);
    session.set_state(ChatState::ProcessingCompleted);
    session.clear_field();
    let text = if empty { RESULT_EMPTY } else { done_text };
    vec![Reply::with_keyboard(text, AFTER_PROCESS_KEYBOARD)]
}

fn send_download(session: &mut Session, encoding: Encoding) -> Result<Vec<Reply>, ChatError> {
    let working = session.working_set().ok_or(ChatError::NothingToDownload)?;
    let bytes = encoding.codec().encode(working)?;
    Ok(vec![
        Reply::text(PREPARING_DOWNLOAD),
        Reply::Document { encoding, bytes },
        Reply::text(RESTART_HINT),
    ])
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{Codec, CsvCodec, JsonCodec};

    fn record(id: i64, name: &str, area: &str, coverage: f64) -> Record {
        Record::new(
            id,
            name.to_string(),
            area.to_string(),
            String::new(),
            String::new(),
            1,
            "Net".to_string(),
            coverage,
            "действует".to_string(),
            "открытая сеть".to_string(),
            String::new(),
            0.0,
            0.0,
            0.0,
            String::new(),
            String::new(),
        )
        .expect("test record is valid")
    }

    fn csv_bytes(records: &[Record]) -> Vec<u8> {
        CsvCodec.encode(records).expect("encode")
    }

    /// Drive the session to `FileUploaded` with the given records stored as CSV.
    fn uploaded_session(records: &[Record]) -> Session {
        let mut session = Session::new();
        handle_text(&mut session, "/uploadFile").expect("upload prompt");
        handle_document(&mut session, "wifi.csv", csv_bytes(records)).expect("stored");
        assert_eq!(session.state(), ChatState::FileUploaded);
        session
    }

    fn texts(replies: &[Reply]) -> Vec<String> {
        replies
            .iter()
            .filter_map(|r| match r {
                Reply::Text { text, .. } => Some(text.clone()),
                Reply::Document { .. } => None,
            })
            .collect()
    }

    #[test]
    fn start_resets_and_greets_from_any_state() {
        let mut session = uploaded_session(&[record(1, "A", "ЦАО", 1.0)]);
        handle_text(&mut session, "/sort").expect("sort prompt");
        let replies = handle_text(&mut session, "/start").expect("start");
        assert_eq!(session.state(), ChatState::Initial);
        assert!(texts(&replies)[0].starts_with("Welcome!"));
    }

    #[test]
    fn download_before_upload_is_refused_and_state_unchanged() {
        let mut session = Session::new();
        let err = handle_text(&mut session, "/download").expect_err("must refuse");
        assert!(matches!(err, ChatError::UploadRequired));
        assert_eq!(session.state(), ChatState::Initial);
    }

    #[test]
    fn upload_file_twice_reprompts_without_error() {
        let mut session = Session::new();
        handle_text(&mut session, "/uploadFile").expect("prompt");
        let replies = handle_text(&mut session, "/uploadFile").expect("reprompt");
        assert_eq!(session.state(), ChatState::AwaitingFileUpload);
        assert_eq!(texts(&replies), vec![UPLOAD_PROMPT.to_string()]);
    }

    #[test]
    fn upload_file_after_upload_is_already_uploaded() {
        let mut session = uploaded_session(&[record(1, "A", "ЦАО", 1.0)]);
        let err = handle_text(&mut session, "/uploadFile").expect_err("must refuse");
        assert!(matches!(err, ChatError::AlreadyUploaded));
        assert_eq!(session.state(), ChatState::FileUploaded);
    }

    #[test]
    fn unsupported_suffix_keeps_awaiting_upload() {
        let mut session = Session::new();
        handle_text(&mut session, "/uploadFile").expect("prompt");
        let err = handle_document(&mut session, "data.xlsx", b"x".to_vec()).expect_err("refuse");
        assert!(matches!(err, ChatError::UnsupportedFile));
        assert_eq!(session.state(), ChatState::AwaitingFileUpload);
        assert!(session.upload().is_none());
    }

    #[test]
    fn unknown_command_is_a_state_error() {
        let mut session = Session::new();
        let err = handle_text(&mut session, "/CSV").expect_err("must refuse");
        assert!(matches!(err, ChatError::State { .. }));
        assert_eq!(session.state(), ChatState::Initial);
    }

    #[test]
    fn filter_flow_stores_working_set_and_completes() {
        let data = vec![
            record(1, "A", "ЦАО", 1.0),
            record(2, "B", "САО", 2.0),
            record(3, "C", "цао", 3.0),
        ];
        let mut session = uploaded_session(&data);
        handle_text(&mut session, "/select").expect("select");
        assert_eq!(session.state(), ChatState::AwaitingSelection);
        handle_text(&mut session, "/AdmArea").expect("field picked");
        assert_eq!(session.state(), ChatState::AwaitingFieldValue);

        let replies = handle_text(&mut session, "ЦАО").expect("filtered");
        assert_eq!(session.state(), ChatState::ProcessingCompleted);
        assert_eq!(texts(&replies), vec![FILTER_DONE.to_string()]);
        let ids: Vec<i64> = session
            .working_set()
            .expect("working set")
            .iter()
            .map(Record::id)
            .collect();
        assert_eq!(ids, vec![1, 3]);
    }

    #[test]
    fn two_field_filter_consumes_both_values() {
        let mut session = uploaded_session(&[record(1, "A", "ЦАО", 1.0)]);
        handle_text(&mut session, "/select").expect("select");
        handle_text(&mut session, "/FunctionFlagAndAccessFlag").expect("picked");
        let replies = handle_text(&mut session, "действует;открытая сеть").expect("filtered");
        assert_eq!(texts(&replies), vec![FILTER_DONE.to_string()]);
        assert_eq!(session.working_set().map(<[Record]>::len), Some(1));
    }

    #[test]
    fn empty_filter_result_reports_empty_but_completes() {
        let mut session = uploaded_session(&[record(1, "A", "ЦАО", 1.0)]);
        handle_text(&mut session, "/select").expect("select");
        handle_text(&mut session, "/WiFiName").expect("picked");
        let replies = handle_text(&mut session, "nothing-matches").expect("filtered");
        assert_eq!(texts(&replies), vec![RESULT_EMPTY.to_string()]);
        assert_eq!(session.state(), ChatState::ProcessingCompleted);
        assert_eq!(session.working_set().map(<[Record]>::len), Some(0));
    }

    #[test]
    fn help_cuts_through_the_value_prompt() {
        let mut session = uploaded_session(&[record(1, "A", "ЦАО", 1.0)]);
        handle_text(&mut session, "/select").expect("select");
        handle_text(&mut session, "/AdmArea").expect("picked");
        let replies = handle_text(&mut session, "/help").expect("help");
        assert_eq!(session.state(), ChatState::AwaitingFieldValue);
        assert_eq!(texts(&replies), vec![HELP_TEXT.to_string()]);
    }

    #[test]
    fn sort_flow_produces_sorted_working_set() {
        let data = vec![
            record(1, "Гамма", "ЦАО", 10.0),
            record(2, "Альфа", "ЦАО", 30.0),
        ];
        let mut session = uploaded_session(&data);
        handle_text(&mut session, "/sort").expect("sort");
        assert_eq!(session.state(), ChatState::AwaitingSorting);
        let replies = handle_text(&mut session, "/LibraryName").expect("sorted");
        assert_eq!(texts(&replies), vec![SORT_DONE.to_string()]);
        let names: Vec<&str> = session
            .working_set()
            .expect("working set")
            .iter()
            .map(Record::library_name)
            .collect();
        assert_eq!(names, vec!["Альфа", "Гамма"]);
    }

    #[test]
    fn decode_failure_returns_to_the_upload_recovery_point() {
        let mut session = Session::new();
        handle_text(&mut session, "/uploadFile").expect("prompt");
        handle_document(&mut session, "broken.csv", b"not a dataset\n".to_vec())
            .expect("stored without decoding");
        handle_text(&mut session, "/sort").expect("sort");
        let err = handle_text(&mut session, "/CoverageArea").expect_err("decode fails");
        assert!(matches!(err, ChatError::Format(_)));
        assert!(err.user_message().contains("/start"));
        assert_eq!(session.state(), ChatState::FileUploaded);
        assert!(session.upload().is_some());
    }

    #[test]
    fn download_flow_returns_the_encoded_working_set() {
        let data = vec![record(1, "B", "ЦАО", 5.0), record(2, "A", "ЦАО", 9.0)];
        let mut session = uploaded_session(&data);
        handle_text(&mut session, "/sort").expect("sort");
        handle_text(&mut session, "/LibraryName").expect("sorted");
        handle_text(&mut session, "/download").expect("download prompt");
        assert_eq!(session.state(), ChatState::AwaitingDownloading);

        let replies = handle_text(&mut session, "/JSON").expect("document");
        assert_eq!(replies.len(), 3);
        let Reply::Document { encoding, bytes } = &replies[1] else {
            unreachable!("second reply is the document");
        };
        assert_eq!(*encoding, Encoding::Json);
        let decoded = JsonCodec.decode(bytes).expect("decode");
        let names: Vec<&str> = decoded.iter().map(Record::library_name).collect();
        assert_eq!(names, vec!["A", "B"]);
    }

    #[test]
    fn csv_download_round_trips_through_the_other_codec() {
        let data = vec![record(1, "A", "ЦАО", 5.0)];
        let mut session = Session::new();
        handle_text(&mut session, "/uploadFile").expect("prompt");
        let json = JsonCodec.encode(&data).expect("encode");
        handle_document(&mut session, "wifi.json", json).expect("stored");
        handle_text(&mut session, "/sort").expect("sort");
        handle_text(&mut session, "/CoverageArea").expect("sorted");
        handle_text(&mut session, "/download").expect("prompt");
        let replies = handle_text(&mut session, "/CSV").expect("document");
        let Reply::Document { bytes, .. } = &replies[1] else {
            unreachable!("second reply is the document");
        };
        assert_eq!(CsvCodec.decode(bytes).expect("decode"), data);
    }
}
