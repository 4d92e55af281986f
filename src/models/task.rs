use serde::{Deserialize, Serialize};
use crate::models::stage::normalize_label;

/// Declares a closed set of form choices with their display labels.
///
/// Parsing is lenient: "Not Interested", "not-interested" and "NOT_INTERESTED"
/// all resolve to the same variant.
macro_rules! choice_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $label:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn label(&self) -> &'static str {
                match self {
                    $($name::$variant => $label),+
                }
            }

            pub fn parse(input: &str) -> Option<Self> {
                let wanted = normalize_label(input);
                Self::ALL.iter().copied().find(|v| normalize_label(v.label()) == wanted)
            }

            pub fn labels() -> Vec<&'static str> {
                Self::ALL.iter().map(|v| v.label()).collect()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.label())
            }
        }
    };
}

choice_enum!(CallType {
    IntroCall => "Intro Call",
    SessionFollowUp => "Session Follow up call",
    SessionReminder => "Session Reminder Call",
    FollowUp => "Followup Call",
});

choice_enum!(
    /// Outcome of a call or meeting
    ConnectStatus {
        Interested => "Interested",
        NotInterested => "Not Interested",
        PlanningLater => "Planning later",
        YetToDecide => "Yet to Decide",
        Irrelevant => "Irrelevant",
        OtherPreferredLanguage => "Other Preferred Language",
        CasualFollowUp => "Casual Follow-up",
        SessionScheduling => "Session Scheduling",
        Dnp => "DNP",
        CallBack => "Call back",
        CallRejected => "Call Rejected",
    }
);

choice_enum!(PrevConsultancy {
    ApplicationStarted => "Application Started",
    OfferReceived => "Offer Received",
    InLoanProcess => "In Loan Process",
    NotStarted => "No, haven't started",
    SessionScheduled => "Session Scheduled",
});

choice_enum!(SessionStatus {
    Confirmed => "Confirmed, Will attend",
    Rescheduled => "Rescheduled",
});

choice_enum!(ShortlistingInitiated {
    RequestedInKc => "Requested In KC",
    DoneByOwn => "Done by own",
});

choice_enum!(ShortlistingStatus {
    New => "New Shortlisting",
    AddOn => "Add-on Shortlisting",
});

choice_enum!(ShortlistingFinalStatus {
    SentToStudents => "Sent to students",
    YetToSend => "Yet to send",
});

choice_enum!(ApplicationProcessKind {
    NewApplication => "New Application Initiated at KC",
    AddOnApplication => "Add-on Application Initiated at KC",
});

choice_enum!(TrackingStatus {
    CredentialsLogging => "Credentials logging",
    ApplicationStatus => "Application Status",
    OfferLetterStatus => "Offer Letter Status",
    VisaTracking => "VISA Tracking",
});

choice_enum!(ApplicationStatus {
    SubmittedToKc => "Application submitted to KC",
    SubmittedToUniversity => "Application submitted to university",
    DocsPending => "Docs Pending",
    InProgress => "In Progress",
    AwaitingDecision => "Awaiting decision",
    Accepted => "Accepted",
    Rejected => "Rejected",
});

choice_enum!(OfferLetterStatus {
    Conditional => "Conditional",
    Unconditional => "Unconditional",
});

choice_enum!(VisaStatus {
    Applied => "Applied",
    InProcess => "In Process",
    Approved => "Approved",
    Rejected => "Rejected",
});

choice_enum!(
    /// Deposit and tuition payment state
    PaymentStatus {
        Paid => "Paid",
        Pending => "Pending",
    }
);

choice_enum!(CommissionStatus {
    Received => "Received",
    Pending => "Pending",
});

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallDetails {
    pub call_type: CallType,
    pub connect_status: ConnectStatus,
    pub country: Option<String>,
    pub intake: Option<String>,
    pub prev_consultancy: Option<PrevConsultancy>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeetDetails {
    pub connect_status: ConnectStatus,
    pub session_status: Option<SessionStatus>,
    pub country: Option<String>,
    pub intake: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShortlistingDetails {
    pub initiated: Option<ShortlistingInitiated>,
    pub status: Option<ShortlistingStatus>,
    pub country: Option<String>,
    pub final_status: ShortlistingFinalStatus,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ApplicationDetails {
    pub process: Option<ApplicationProcessKind>,
}

/// University portal credentials captured by a credentials-logging task
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CredentialInput {
    pub university_name: String,
    pub url: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackingDetails {
    pub status: TrackingStatus,
    pub application_status: Option<ApplicationStatus>,
    pub offer_letter: Option<OfferLetterStatus>,
    pub visa: Option<VisaStatus>,
    pub deposit: Option<PaymentStatus>,
    pub tuition: Option<PaymentStatus>,
    pub commission: Option<CommissionStatus>,
    /// Never persisted with the task; credentials live in the university applications log.
    #[serde(skip)]
    pub credential: Option<CredentialInput>,
}

impl TrackingDetails {
    pub fn new(status: TrackingStatus) -> Self {
        Self {
            status,
            application_status: None,
            offer_letter: None,
            visa: None,
            deposit: None,
            tuition: None,
            commission: None,
            credential: None,
        }
    }
}

/// What kind of interaction a task records, with the attributes that kind carries
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TaskKind {
    Call(CallDetails),
    MeetDone(MeetDetails),
    SubmitDocuments,
    Shortlisting(ShortlistingDetails),
    ApplicationProcess(ApplicationDetails),
    Tracking(TrackingDetails),
}

/// Task type names as accepted on the command line
pub const TASK_TYPES: &[&str] = &[
    "Call",
    "Meet Done",
    "Submit Documents",
    "Shortlisting",
    "Application Process",
    "Tracking",
];

impl TaskKind {
    pub fn type_label(&self) -> &'static str {
        match self {
            TaskKind::Call(_) => "Call",
            TaskKind::MeetDone(_) => "Meet Done",
            TaskKind::SubmitDocuments => "Submit Documents",
            TaskKind::Shortlisting(_) => "Shortlisting",
            TaskKind::ApplicationProcess(_) => "Application Process",
            TaskKind::Tracking(_) => "Tracking",
        }
    }

    /// Short status line for task logs: the most specific attribute the task carries
    pub fn status_summary(&self) -> String {
        match self {
            TaskKind::Call(d) => format!("{} / {}", d.call_type, d.connect_status),
            TaskKind::MeetDone(d) => d.connect_status.to_string(),
            TaskKind::SubmitDocuments => "Completed".to_string(),
            TaskKind::Shortlisting(d) => d.final_status.to_string(),
            TaskKind::ApplicationProcess(d) => d
                .process
                .map(|p| p.to_string())
                .unwrap_or_else(|| "Completed".to_string()),
            TaskKind::Tracking(d) => {
                let detail = d.visa.map(|v| v.label())
                    .or(d.offer_letter.map(|o| o.label()))
                    .or(d.application_status.map(|a| a.label()));
                match detail {
                    Some(detail) => format!("{} / {}", d.status, detail),
                    None => d.status.to_string(),
                }
            }
        }
    }

    /// Credentials to log, for credentials-logging tracking tasks only
    pub fn credential(&self) -> Option<&CredentialInput> {
        match self {
            TaskKind::Tracking(d) if d.status == TrackingStatus::CredentialsLogging => d.credential.as_ref(),
            _ => None,
        }
    }

    /// Attribute pairs for display, in form order
    pub fn attributes(&self) -> Vec<(&'static str, String)> {
        let mut attrs = Vec::new();
        match self {
            TaskKind::Call(d) => {
                attrs.push(("Call Type", d.call_type.to_string()));
                attrs.push(("Connect Status", d.connect_status.to_string()));
                push_opt(&mut attrs, "Country", d.country.clone());
                push_opt(&mut attrs, "Intake", d.intake.clone());
                push_opt(&mut attrs, "Previous Consultancy", d.prev_consultancy.map(|p| p.to_string()));
            }
            TaskKind::MeetDone(d) => {
                attrs.push(("Connect Status", d.connect_status.to_string()));
                push_opt(&mut attrs, "Session Status", d.session_status.map(|s| s.to_string()));
                push_opt(&mut attrs, "Country", d.country.clone());
                push_opt(&mut attrs, "Intake", d.intake.clone());
            }
            TaskKind::SubmitDocuments => {}
            TaskKind::Shortlisting(d) => {
                push_opt(&mut attrs, "Initiated", d.initiated.map(|i| i.to_string()));
                push_opt(&mut attrs, "Shortlisting", d.status.map(|s| s.to_string()));
                push_opt(&mut attrs, "Country", d.country.clone());
                attrs.push(("Final Status", d.final_status.to_string()));
            }
            TaskKind::ApplicationProcess(d) => {
                push_opt(&mut attrs, "Application Process", d.process.map(|p| p.to_string()));
            }
            TaskKind::Tracking(d) => {
                attrs.push(("Tracking Status", d.status.to_string()));
                push_opt(&mut attrs, "Application Status", d.application_status.map(|s| s.to_string()));
                push_opt(&mut attrs, "Offer Letter", d.offer_letter.map(|s| s.to_string()));
                push_opt(&mut attrs, "Visa", d.visa.map(|s| s.to_string()));
                push_opt(&mut attrs, "Deposit", d.deposit.map(|s| s.to_string()));
                push_opt(&mut attrs, "Tuition", d.tuition.map(|s| s.to_string()));
                push_opt(&mut attrs, "Commission", d.commission.map(|s| s.to_string()));
            }
        }
        attrs
    }
}

fn push_opt(attrs: &mut Vec<(&'static str, String)>, name: &'static str, value: Option<String>) {
    if let Some(value) = value {
        attrs.push((name, value));
    }
}

/// One logged interaction with a lead
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeadTask {
    pub id: Option<i64>,
    pub lead_id: i64,
    pub kind: TaskKind,
    pub remarks: Option<String>,
    pub actor: String,
    pub created_ts: i64,
}

impl LeadTask {
    pub fn new(lead_id: i64, kind: TaskKind, remarks: Option<String>, actor: &str) -> Self {
        Self {
            id: None,
            lead_id,
            kind,
            remarks: remarks.filter(|r| !r.trim().is_empty()),
            actor: actor.to_string(),
            created_ts: chrono::Utc::now().timestamp(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_choice_parse_is_lenient() {
        assert_eq!(ConnectStatus::parse("Not Interested"), Some(ConnectStatus::NotInterested));
        assert_eq!(ConnectStatus::parse("not-interested"), Some(ConnectStatus::NotInterested));
        assert_eq!(ConnectStatus::parse("dnp"), Some(ConnectStatus::Dnp));
        assert_eq!(TrackingStatus::parse("visa tracking"), Some(TrackingStatus::VisaTracking));
        assert_eq!(VisaStatus::parse("in_process"), Some(VisaStatus::InProcess));
        assert_eq!(VisaStatus::parse("granted"), None);
    }

    #[test]
    fn test_labels_round_trip() {
        for status in ConnectStatus::ALL {
            assert_eq!(ConnectStatus::parse(status.label()), Some(*status));
        }
        assert_eq!(ShortlistingFinalStatus::labels(), vec!["Sent to students", "Yet to send"]);
    }

    #[test]
    fn test_task_kind_json_drops_credentials() {
        let mut details = TrackingDetails::new(TrackingStatus::CredentialsLogging);
        details.credential = Some(CredentialInput {
            university_name: "MIT".to_string(),
            password: Some("secret".to_string()),
            ..Default::default()
        });
        let kind = TaskKind::Tracking(details);
        let json = serde_json::to_string(&kind).unwrap();
        assert!(json.contains("\"type\":\"tracking\""));
        assert!(!json.contains("secret"));

        let back: TaskKind = serde_json::from_str(&json).unwrap();
        assert_eq!(back.type_label(), "Tracking");
        assert!(back.credential().is_none());
    }

    #[test]
    fn test_status_summary() {
        assert_eq!(TaskKind::SubmitDocuments.status_summary(), "Completed");
        let kind = TaskKind::Shortlisting(ShortlistingDetails {
            initiated: None,
            status: None,
            country: None,
            final_status: ShortlistingFinalStatus::SentToStudents,
        });
        assert_eq!(kind.status_summary(), "Sent to students");
    }

    #[test]
    fn test_blank_remarks_are_dropped() {
        let task = LeadTask::new(1, TaskKind::SubmitDocuments, Some("   ".to_string()), "Sarah");
        assert!(task.remarks.is_none());
        assert!(task.id.is_none());
    }
}
