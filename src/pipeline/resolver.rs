//! Stage transition rules.
//!
//! A task's attributes decide whether, and where, the lead moves next. The
//! resolver is pure; [`crate::pipeline::workflow::record_task`] applies the result.

use crate::models::{
    CommissionStatus, ConnectStatus, PaymentStatus, ShortlistingFinalStatus,
    Stage, TaskKind, TrackingDetails, TrackingStatus, VisaStatus,
};

/// Stage a task moves the lead to, or `None` for no transition
pub fn resolve_next_stage(kind: &TaskKind) -> Option<Stage> {
    match kind {
        TaskKind::Call(details) => connect_outcome(details.connect_status),
        TaskKind::MeetDone(details) => match details.connect_status {
            ConnectStatus::Interested => Some(Stage::SessionCompleted),
            other => connect_outcome(other),
        },
        TaskKind::SubmitDocuments => Some(Stage::DocsSubmitted),
        TaskKind::Shortlisting(details) => match details.final_status {
            ShortlistingFinalStatus::SentToStudents => Some(Stage::ShortlistedUniv),
            ShortlistingFinalStatus::YetToSend => None,
        },
        TaskKind::ApplicationProcess(_) => Some(Stage::ApplicationInProgress),
        TaskKind::Tracking(details) => tracking_outcome(details),
    }
}

/// Shared Call / Meet Done mapping
fn connect_outcome(status: ConnectStatus) -> Option<Stage> {
    match status {
        ConnectStatus::Dnp | ConnectStatus::CallBack | ConnectStatus::CallRejected => Some(Stage::ContactAgain),
        ConnectStatus::NotInterested => Some(Stage::NotInterested),
        ConnectStatus::PlanningLater => Some(Stage::PlanningLater),
        ConnectStatus::YetToDecide => Some(Stage::YetToDecide),
        ConnectStatus::Irrelevant => Some(Stage::IrrelevantLead),
        ConnectStatus::SessionScheduling => Some(Stage::RegisteredForSession),
        ConnectStatus::Interested
        | ConnectStatus::OtherPreferredLanguage
        | ConnectStatus::CasualFollowUp => None,
    }
}

/// Tracking rules, first match wins
fn tracking_outcome(details: &TrackingDetails) -> Option<Stage> {
    if details.status == TrackingStatus::OfferLetterStatus && details.offer_letter.is_some() {
        return Some(Stage::OfferLetterReceived);
    }
    if details.status == TrackingStatus::VisaTracking && details.visa == Some(VisaStatus::Approved) {
        return Some(Stage::VisaReceived);
    }
    if details.deposit == Some(PaymentStatus::Paid) {
        return Some(Stage::DepositPaid);
    }
    if details.tuition == Some(PaymentStatus::Paid) {
        return Some(Stage::TuitionFeePaid);
    }
    if details.commission == Some(CommissionStatus::Received) {
        return Some(Stage::CommissionReceived);
    }
    None
}
