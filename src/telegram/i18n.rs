#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Locale {
    #[default]
    En,
    Es,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Text {
    CommandStart,
    CommandReport,
    CommandHistory,
    CommandTimezone,
    CommandCancel,
    CommandHelp,
    UserWelcome,
    UserHello,
    NotRegistered,
    ReportTitlePrompt,
    ReportStopped,
    NotValid,
    NoActiveReport,
    ReportAlreadyActive,
    InvalidTransition,
    ReportNotFound,
    CorruptReport,
    Cancelled,
    UnknownMessage,
    HistoryEmpty,
    HistoryHeader,
    TimezoneSet,
    TimezoneInvalid,
    StateRunning,
    StatePaused,
    StateCompleted,
    Started,
    Elapsed,
    Paused,
    Resumed,
}

impl Locale {
    pub fn from_code(code: &str) -> Self {
        match code {
            "es" => Locale::Es,
            _ => Locale::En,
        }
    }

    pub fn code(self) -> &'static str {
        match self {
            Locale::En => "en",
            Locale::Es => "es",
        }
    }

    pub fn text(self, text: Text) -> &'static str {
        match self {
            Locale::En => english(text),
            Locale::Es => spanish(text),
        }
    }
}

fn english(text: Text) -> &'static str {
    match text {
        Text::CommandStart => "Register or refresh your profile",
        Text::CommandReport => "Start a report or show the active one",
        Text::CommandHistory => "Show your latest reports",
        Text::CommandTimezone => "Set your timezone, e.g. /timezone Europe/Madrid",
        Text::CommandCancel => "Cancel the current operation",
        Text::CommandHelp => "Show available commands",
        Text::UserWelcome => "Welcome! Use /report to start tracking time.",
        Text::UserHello => "Hello again! Use /report to start tracking time.",
        Text::NotRegistered => "I don't know you yet. Please send /start first.",
        Text::ReportTitlePrompt => "Please send me the title of the new report.",
        Text::ReportStopped => "Report stopped. Use /report to start a new one.",
        Text::NotValid => "Not valid",
        Text::NoActiveReport => "There is no active report.",
        Text::ReportAlreadyActive => "Another report is already active.",
        Text::InvalidTransition => "This action is not available right now.",
        Text::ReportNotFound => "Report not found.",
        Text::CorruptReport => "This report has inconsistent data and cannot be processed.",
        Text::Cancelled => "Cancelled current operation.",
        Text::UnknownMessage => "Unable to handle the message. Use /help to see the commands.",
        Text::HistoryEmpty => "You have no reports yet.",
        Text::HistoryHeader => "Your latest reports:",
        Text::TimezoneSet => "Timezone saved.",
        Text::TimezoneInvalid => "Unknown timezone. Example: /timezone Europe/Madrid",
        Text::StateRunning => "running",
        Text::StatePaused => "paused",
        Text::StateCompleted => "completed",
        Text::Started => "Started",
        Text::Elapsed => "Elapsed",
        Text::Paused => "Paused",
        Text::Resumed => "Resumed",
    }
}

fn spanish(text: Text) -> &'static str {
    match text {
        Text::CommandStart => "Registrar o actualizar tu perfil",
        Text::CommandReport => "Iniciar un informe o mostrar el activo",
        Text::CommandHistory => "Mostrar tus últimos informes",
        Text::CommandTimezone => "Configurar tu zona horaria, p. ej. /timezone Europe/Madrid",
        Text::CommandCancel => "Cancelar la operación actual",
        Text::CommandHelp => "Mostrar los comandos disponibles",
        Text::UserWelcome => "¡Bienvenido! Usa /report para empezar a contar el tiempo.",
        Text::UserHello => "¡Hola de nuevo! Usa /report para empezar a contar el tiempo.",
        Text::NotRegistered => "Todavía no te conozco. Envía /start primero.",
        Text::ReportTitlePrompt => "Envíame el título del nuevo informe.",
        Text::ReportStopped => "Informe detenido. Usa /report para empezar otro.",
        Text::NotValid => "No válido",
        Text::NoActiveReport => "No hay ningún informe activo.",
        Text::ReportAlreadyActive => "Ya hay otro informe activo.",
        Text::InvalidTransition => "Esta acción no está disponible ahora.",
        Text::ReportNotFound => "Informe no encontrado.",
        Text::CorruptReport => "Este informe tiene datos inconsistentes y no se puede procesar.",
        Text::Cancelled => "Operación cancelada.",
        Text::UnknownMessage => "No puedo procesar el mensaje. Usa /help para ver los comandos.",
        Text::HistoryEmpty => "Todavía no tienes informes.",
        Text::HistoryHeader => "Tus últimos informes:",
        Text::TimezoneSet => "Zona horaria guardada.",
        Text::TimezoneInvalid => "Zona horaria desconocida. Ejemplo: /timezone Europe/Madrid",
        Text::StateRunning => "en curso",
        Text::StatePaused => "en pausa",
        Text::StateCompleted => "terminado",
        Text::Started => "Inicio",
        Text::Elapsed => "Tiempo",
        Text::Paused => "En pausa",
        Text::Resumed => "Reanudado",
    }
}
