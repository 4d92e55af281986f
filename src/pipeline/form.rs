//! Task composer: builds a typed [`TaskKind`] from `field=value` pairs.
//!
//! Field names are matched loosely (`connect_status`, `connectStatus` and
//! `connect-status` are the same field). Choice values are matched the same
//! way against their labels. Missing required fields block the write.

use crate::error::CrmError;
use crate::models::{
    normalize_label, ApplicationDetails, ApplicationProcessKind, ApplicationStatus, CallDetails,
    CallType, CommissionStatus, ConnectStatus, CredentialInput, MeetDetails, OfferLetterStatus,
    PaymentStatus, PrevConsultancy, SessionStatus, ShortlistingDetails, ShortlistingFinalStatus,
    ShortlistingInitiated, ShortlistingStatus, TaskKind, TrackingDetails, TrackingStatus,
    VisaStatus, TASK_TYPES,
};
use crate::utils::fuzzy;

/// A composed task ready to be recorded
#[derive(Debug, Clone, PartialEq)]
pub struct TaskForm {
    pub kind: TaskKind,
    pub remarks: Option<String>,
}

/// Field names accepted per task type, as shown in help and suggestions
pub fn fields_for(task_type: &str) -> &'static [&'static str] {
    match task_type {
        "Call" => &["call_type", "connect_status", "country", "intake", "prev_consultancy"],
        "Meet Done" => &["connect_status", "session_status", "country", "intake"],
        "Submit Documents" => &[],
        "Shortlisting" => &["initiated", "shortlisting", "country", "final_status"],
        "Application Process" => &["process"],
        "Tracking" => &[
            "status", "application_status", "offer_letter", "visa", "deposit", "tuition",
            "commission", "university", "url", "username", "password",
        ],
        _ => &[],
    }
}

/// Fields accepted by every task type
const COMMON_FIELDS: &[&str] = &["type", "remarks"];

/// Resolve a task type name leniently ("meet-done", "meet done")
pub fn parse_task_type(input: &str) -> Result<&'static str, CrmError> {
    let wanted = normalize_label(input);
    TASK_TYPES
        .iter()
        .copied()
        .find(|t| normalize_label(t) == wanted)
        .ok_or_else(|| CrmError::InvalidValue {
            field: "type".to_string(),
            value: input.to_string(),
            allowed: TASK_TYPES.to_vec(),
        })
}

/// Pending field values; each `take` consumes a field so leftovers can be reported
struct Fields {
    entries: Vec<(String, String)>,
}

impl Fields {
    fn new(pairs: &[(String, String)]) -> Result<Self, CrmError> {
        let mut entries: Vec<(String, String)> = Vec::new();
        for (key, value) in pairs {
            if entries.iter().any(|(k, _)| normalize_label(k) == normalize_label(key)) {
                return Err(CrmError::Validation(format!("Field '{}' given more than once", key)));
            }
            entries.push((key.clone(), value.trim().to_string()));
        }
        Ok(Self { entries })
    }

    /// Remove a field by name or alias. Empty values count as absent.
    fn take(&mut self, names: &[&str]) -> Option<String> {
        let pos = self.entries.iter().position(|(k, _)| {
            let k = normalize_label(k);
            names.iter().any(|n| normalize_label(n) == k)
        })?;
        let (_, value) = self.entries.remove(pos);
        Some(value).filter(|v| !v.is_empty())
    }

    fn require(&mut self, task_type: &str, name: &'static str) -> Result<String, CrmError> {
        self.take(&[name]).ok_or_else(|| CrmError::MissingField {
            task_type: task_type.to_string(),
            field: name,
        })
    }

    /// Fail on the first field nobody consumed
    fn finish(self, task_type: &str) -> Result<(), CrmError> {
        if let Some((field, _)) = self.entries.into_iter().next() {
            let mut known: Vec<&str> = fields_for(task_type).to_vec();
            known.extend_from_slice(COMMON_FIELDS);
            return Err(CrmError::UnknownField {
                suggestion: fuzzy::suggest(&field, &known),
                field,
            });
        }
        Ok(())
    }
}

fn choice<T>(
    field: &str,
    value: &str,
    parse: fn(&str) -> Option<T>,
    labels: fn() -> Vec<&'static str>,
) -> Result<T, CrmError> {
    parse(value).ok_or_else(|| CrmError::InvalidValue {
        field: field.to_string(),
        value: value.to_string(),
        allowed: labels(),
    })
}

fn optional_choice<T>(
    field: &str,
    value: Option<String>,
    parse: fn(&str) -> Option<T>,
    labels: fn() -> Vec<&'static str>,
) -> Result<Option<T>, CrmError> {
    value.map(|v| choice(field, &v, parse, labels)).transpose()
}

/// Build a task from `field=value` pairs. `type` is required.
pub fn build_task(pairs: &[(String, String)]) -> Result<TaskForm, CrmError> {
    let mut fields = Fields::new(pairs)?;

    let raw_type = fields.take(&["type", "task_type"]).ok_or_else(|| {
        CrmError::Validation(format!(
            "Missing required field 'type'. One of: {}",
            TASK_TYPES.join(", ")
        ))
    })?;
    let task_type = parse_task_type(&raw_type)?;
    let remarks = fields.take(&["remarks", "remark", "note"]);

    let kind = match task_type {
        "Call" => {
            let call_type = fields.require(task_type, "call_type")?;
            let connect_status = fields.require(task_type, "connect_status")?;
            TaskKind::Call(CallDetails {
                call_type: choice("call_type", &call_type, CallType::parse, CallType::labels)?,
                connect_status: choice("connect_status", &connect_status, ConnectStatus::parse, ConnectStatus::labels)?,
                country: fields.take(&["country"]),
                intake: fields.take(&["intake"]),
                prev_consultancy: optional_choice(
                    "prev_consultancy",
                    fields.take(&["prev_consultancy", "previous_consultancy"]),
                    PrevConsultancy::parse,
                    PrevConsultancy::labels,
                )?,
            })
        }
        "Meet Done" => {
            let connect_status = fields.require(task_type, "connect_status")?;
            TaskKind::MeetDone(MeetDetails {
                connect_status: choice("connect_status", &connect_status, ConnectStatus::parse, ConnectStatus::labels)?,
                session_status: optional_choice(
                    "session_status",
                    fields.take(&["session_status"]),
                    SessionStatus::parse,
                    SessionStatus::labels,
                )?,
                country: fields.take(&["country"]),
                intake: fields.take(&["intake"]),
            })
        }
        "Submit Documents" => TaskKind::SubmitDocuments,
        "Shortlisting" => {
            let final_status = fields.require(task_type, "final_status")?;
            TaskKind::Shortlisting(ShortlistingDetails {
                initiated: optional_choice(
                    "initiated",
                    fields.take(&["initiated", "shortlisting_initiated"]),
                    ShortlistingInitiated::parse,
                    ShortlistingInitiated::labels,
                )?,
                status: optional_choice(
                    "shortlisting",
                    fields.take(&["shortlisting", "shortlisting_status"]),
                    ShortlistingStatus::parse,
                    ShortlistingStatus::labels,
                )?,
                country: fields.take(&["country"]),
                final_status: choice("final_status", &final_status, ShortlistingFinalStatus::parse, ShortlistingFinalStatus::labels)?,
            })
        }
        "Application Process" => TaskKind::ApplicationProcess(ApplicationDetails {
            process: optional_choice(
                "process",
                fields.take(&["process", "application_process"]),
                ApplicationProcessKind::parse,
                ApplicationProcessKind::labels,
            )?,
        }),
        "Tracking" => TaskKind::Tracking(build_tracking(task_type, &mut fields)?),
        other => {
            return Err(CrmError::Validation(format!("Task type '{}' is not supported", other)));
        }
    };

    fields.finish(task_type)?;
    Ok(TaskForm { kind, remarks })
}

fn build_tracking(task_type: &str, fields: &mut Fields) -> Result<TrackingDetails, CrmError> {
    let status = fields.require(task_type, "status")?;
    let status = choice("status", &status, TrackingStatus::parse, TrackingStatus::labels)?;

    let mut details = TrackingDetails::new(status);
    details.application_status = optional_choice(
        "application_status",
        fields.take(&["application_status"]),
        ApplicationStatus::parse,
        ApplicationStatus::labels,
    )?;
    details.offer_letter = optional_choice(
        "offer_letter",
        fields.take(&["offer_letter", "offer_letter_status"]),
        OfferLetterStatus::parse,
        OfferLetterStatus::labels,
    )?;
    details.visa = optional_choice("visa", fields.take(&["visa", "visa_status"]), VisaStatus::parse, VisaStatus::labels)?;
    details.deposit = optional_choice("deposit", fields.take(&["deposit", "deposit_status"]), PaymentStatus::parse, PaymentStatus::labels)?;
    details.tuition = optional_choice("tuition", fields.take(&["tuition", "tuition_status"]), PaymentStatus::parse, PaymentStatus::labels)?;
    details.commission = optional_choice(
        "commission",
        fields.take(&["commission", "commission_status"]),
        CommissionStatus::parse,
        CommissionStatus::labels,
    )?;

    let university = fields.take(&["university", "university_name"]);
    let url = fields.take(&["url"]);
    let username = fields.take(&["username"]);
    let password = fields.take(&["password"]);

    if status == TrackingStatus::CredentialsLogging {
        let university_name = university.ok_or_else(|| CrmError::MissingField {
            task_type: format!("{} ({})", task_type, status),
            field: "university",
        })?;
        details.credential = Some(CredentialInput {
            university_name,
            url,
            username,
            password,
        });
    } else if university.is_some() || url.is_some() || username.is_some() || password.is_some() {
        return Err(CrmError::Validation(format!(
            "University credentials can only be logged with status '{}'",
            TrackingStatus::CredentialsLogging
        )));
    }

    Ok(details)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs(items: &[(&str, &str)]) -> Vec<(String, String)> {
        items.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn test_build_call() {
        let form = build_task(&pairs(&[
            ("type", "call"),
            ("call_type", "Intro Call"),
            ("connectStatus", "not interested"),
            ("country", "Canada"),
            ("remarks", "Will revisit next year"),
        ]))
        .unwrap();

        match form.kind {
            TaskKind::Call(d) => {
                assert_eq!(d.connect_status, ConnectStatus::NotInterested);
                assert_eq!(d.country.as_deref(), Some("Canada"));
            }
            other => panic!("unexpected kind {:?}", other),
        }
        assert_eq!(form.remarks.as_deref(), Some("Will revisit next year"));
    }

    #[test]
    fn test_missing_required_field_names_it() {
        let err = build_task(&pairs(&[("type", "Call"), ("call_type", "Intro Call")])).unwrap_err();
        match err {
            CrmError::MissingField { field, .. } => assert_eq!(field, "connect_status"),
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_missing_type() {
        let err = build_task(&pairs(&[("connect_status", "Interested")])).unwrap_err();
        assert!(err.to_string().contains("'type'"));
    }

    #[test]
    fn test_invalid_choice_lists_allowed() {
        let err = build_task(&pairs(&[("type", "Tracking"), ("status", "VISA Tracking"), ("visa", "granted")])).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("granted"));
        assert!(message.contains("Approved"));
    }

    #[test]
    fn test_unknown_field_suggestion() {
        let err = build_task(&pairs(&[("type", "Shortlisting"), ("final_staus", "Sent to students")])).unwrap_err();
        // The misspelt field means final_status is missing first
        assert!(matches!(err, CrmError::MissingField { field: "final_status", .. }));

        let err = build_task(&pairs(&[
            ("type", "Shortlisting"),
            ("final_status", "Sent to students"),
            ("contry", "UK"),
        ]))
        .unwrap_err();
        match err {
            CrmError::UnknownField { field, suggestion } => {
                assert_eq!(field, "contry");
                assert_eq!(suggestion.as_deref(), Some("country"));
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_credentials_logging_requires_university() {
        let err = build_task(&pairs(&[("type", "Tracking"), ("status", "Credentials logging")])).unwrap_err();
        assert!(matches!(err, CrmError::MissingField { field: "university", .. }));

        let form = build_task(&pairs(&[
            ("type", "Tracking"),
            ("status", "Credentials logging"),
            ("university", "MIT"),
            ("username", "alice"),
            ("password", "s3cret"),
        ]))
        .unwrap();
        let credential = form.kind.credential().unwrap();
        assert_eq!(credential.university_name, "MIT");
        assert_eq!(credential.password.as_deref(), Some("s3cret"));
    }

    #[test]
    fn test_credentials_rejected_for_other_status() {
        let err = build_task(&pairs(&[("type", "Tracking"), ("status", "VISA Tracking"), ("password", "x")])).unwrap_err();
        assert!(matches!(err, CrmError::Validation(_)));
    }

    #[test]
    fn test_duplicate_field_rejected() {
        let err = build_task(&pairs(&[("type", "Call"), ("Type", "Call")])).unwrap_err();
        assert!(matches!(err, CrmError::Validation(_)));
    }

    #[test]
    fn test_submit_documents_has_no_fields() {
        let form = build_task(&pairs(&[("type", "submit documents")])).unwrap();
        assert_eq!(form.kind, TaskKind::SubmitDocuments);
        assert!(form.remarks.is_none());
    }
}
