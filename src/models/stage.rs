use serde::{Deserialize, Serialize};

/// Pipeline stage of a lead.
///
/// The pipeline is a fixed, ordered list of 18 stages. A lead's state is its
/// position in this list, so the enum discriminant doubles as the index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum Stage {
    YetToAssign = 0,
    YetToContact = 1,
    ContactAgain = 2,
    NotInterested = 3,
    PlanningLater = 4,
    YetToDecide = 5,
    IrrelevantLead = 6,
    RegisteredForSession = 7,
    SessionCompleted = 8,
    DocsSubmitted = 9,
    ShortlistedUniv = 10,
    ApplicationInProgress = 11,
    OfferLetterReceived = 12,
    DepositPaid = 13,
    VisaReceived = 14,
    FlightAndAccommodationBooked = 15,
    TuitionFeePaid = 16,
    CommissionReceived = 17,
}

/// Coarse grouping of stages used for colouring and pipeline summaries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Phase {
    Intake,
    Nurture,
    Counseling,
    Application,
    Closing,
}

impl Phase {
    pub const ALL: [Phase; 5] = [
        Phase::Intake,
        Phase::Nurture,
        Phase::Counseling,
        Phase::Application,
        Phase::Closing,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Phase::Intake => "Intake",
            Phase::Nurture => "Nurture",
            Phase::Counseling => "Counseling",
            Phase::Application => "Application",
            Phase::Closing => "Closing",
        }
    }

    pub fn color(&self) -> &'static str {
        match self {
            Phase::Intake => "red",
            Phase::Nurture => "yellow",
            Phase::Counseling => "blue",
            Phase::Application => "magenta",
            Phase::Closing => "green",
        }
    }
}

impl Stage {
    /// All stages in pipeline order
    pub const ALL: [Stage; 18] = [
        Stage::YetToAssign,
        Stage::YetToContact,
        Stage::ContactAgain,
        Stage::NotInterested,
        Stage::PlanningLater,
        Stage::YetToDecide,
        Stage::IrrelevantLead,
        Stage::RegisteredForSession,
        Stage::SessionCompleted,
        Stage::DocsSubmitted,
        Stage::ShortlistedUniv,
        Stage::ApplicationInProgress,
        Stage::OfferLetterReceived,
        Stage::DepositPaid,
        Stage::VisaReceived,
        Stage::FlightAndAccommodationBooked,
        Stage::TuitionFeePaid,
        Stage::CommissionReceived,
    ];

    pub const COUNT: usize = Self::ALL.len();

    /// Index of the terminal stage
    pub const LAST_INDEX: usize = Self::COUNT - 1;

    /// Leads at or beyond this stage count as converted
    pub const CONVERSION_THRESHOLD: Stage = Stage::ApplicationInProgress;

    pub fn index(&self) -> usize {
        *self as usize
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    pub fn label(&self) -> &'static str {
        match self {
            Stage::YetToAssign => "Yet to Assign",
            Stage::YetToContact => "Yet to Contact",
            Stage::ContactAgain => "Contact Again",
            Stage::NotInterested => "Not Interested",
            Stage::PlanningLater => "Planning Later",
            Stage::YetToDecide => "Yet to Decide",
            Stage::IrrelevantLead => "Irrelevant Lead",
            Stage::RegisteredForSession => "Registered for Session",
            Stage::SessionCompleted => "Session Completed",
            Stage::DocsSubmitted => "Docs Submitted",
            Stage::ShortlistedUniv => "Shortlisted Univ.",
            Stage::ApplicationInProgress => "Application in Progress",
            Stage::OfferLetterReceived => "Offer Letter Received",
            Stage::DepositPaid => "Deposit Paid",
            Stage::VisaReceived => "Visa Received",
            Stage::FlightAndAccommodationBooked => "Flight and Accommodation Booked",
            Stage::TuitionFeePaid => "Tuition Fee Paid",
            Stage::CommissionReceived => "Commission Received",
        }
    }

    /// Exact label lookup. Returns None on a miss; callers treat that as "no stage".
    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|s| s.label() == label)
    }

    /// Lenient lookup used for user input: case, spacing and punctuation are
    /// ignored, and a bare index ("10") is accepted.
    pub fn parse(input: &str) -> Option<Self> {
        let trimmed = input.trim();
        if let Ok(index) = trimmed.parse::<usize>() {
            return Self::from_index(index);
        }
        let wanted = normalize_label(trimmed);
        if wanted.is_empty() {
            return None;
        }
        Self::ALL.iter().copied().find(|s| normalize_label(s.label()) == wanted)
    }

    /// The stage one position further along, or None at the terminal stage
    pub fn next(&self) -> Option<Self> {
        Self::from_index(self.index() + 1)
    }

    pub fn is_terminal(&self) -> bool {
        self.index() == Self::LAST_INDEX
    }

    pub fn is_converted(&self) -> bool {
        *self >= Self::CONVERSION_THRESHOLD
    }

    pub fn phase(&self) -> Phase {
        match self.index() {
            0..=1 => Phase::Intake,
            2..=6 => Phase::Nurture,
            7..=10 => Phase::Counseling,
            11..=14 => Phase::Application,
            _ => Phase::Closing,
        }
    }

    /// Progress through the pipeline as a percentage, counting the current stage as reached
    pub fn progress_percent(&self) -> f64 {
        (self.index() + 1) as f64 / Self::COUNT as f64 * 100.0
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

impl From<Stage> for String {
    fn from(stage: Stage) -> Self {
        stage.label().to_string()
    }
}

impl TryFrom<String> for Stage {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Stage::from_label(&value).ok_or_else(|| format!("unknown stage '{}'", value))
    }
}

/// Lowercase alphanumerics only, so "Shortlisted Univ." == "shortlisted-univ"
pub fn normalize_label(s: &str) -> String {
    s.chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(|c| c.to_lowercase())
        .collect()
}
