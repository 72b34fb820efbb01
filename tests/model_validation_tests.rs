use talent_bridge::models::{
    Application, ApplicationStatus, Role, UpdateApplicationStatusRequest, User,
};

// --- Role Enumeration ---

#[test]
fn test_role_wire_spelling_round_trip() {
    for (role, spelling) in [
        (Role::Admin, "\"admin\""),
        (Role::Employer, "\"employer\""),
        (Role::Seeker, "\"seeker\""),
    ] {
        assert_eq!(serde_json::to_string(&role).unwrap(), spelling);
        let parsed: Role = serde_json::from_str(spelling).unwrap();
        assert_eq!(parsed, role);
    }
}

#[test]
fn test_role_parse_is_fail_closed() {
    // Database decoding goes through TryFrom<String>; anything outside the
    // role set must be an error, never a silent default.
    assert!(Role::try_from("superuser".to_string()).is_err());
    assert!(Role::try_from("".to_string()).is_err());
    assert!(Role::try_from("Admin".to_string()).is_err());
    assert_eq!(Role::try_from("employer".to_string()).unwrap(), Role::Employer);
}

#[test]
fn test_role_group_names() {
    assert_eq!(Role::Admin.group_name(), "Admin");
    assert_eq!(Role::Employer.group_name(), "Employer");
    assert_eq!(Role::Seeker.group_name(), "Job Seeker");
}

// --- Application Status ---

#[test]
fn test_status_wire_spellings() {
    let all = [
        (ApplicationStatus::Pending, "pending"),
        (ApplicationStatus::Reviewed, "reviewed"),
        (ApplicationStatus::Interviewed, "interviewed"),
        (ApplicationStatus::Offered, "offered"),
        (ApplicationStatus::Accepted, "accepted"),
        (ApplicationStatus::Rejected, "rejected"),
        (ApplicationStatus::Withdrawn, "withdrawn"),
    ];
    for (status, spelling) in all {
        assert_eq!(status.as_str(), spelling);
        assert_eq!(
            serde_json::to_string(&status).unwrap(),
            format!("\"{}\"", spelling)
        );
        assert_eq!(
            ApplicationStatus::try_from(spelling.to_string()).unwrap(),
            status
        );
    }
}

#[test]
fn test_terminal_status_set() {
    assert!(ApplicationStatus::Accepted.is_terminal());
    assert!(ApplicationStatus::Rejected.is_terminal());
    assert!(ApplicationStatus::Withdrawn.is_terminal());

    assert!(!ApplicationStatus::Pending.is_terminal());
    assert!(!ApplicationStatus::Reviewed.is_terminal());
    assert!(!ApplicationStatus::Interviewed.is_terminal());
    assert!(!ApplicationStatus::Offered.is_terminal());
}

#[test]
fn test_status_update_payload_rejects_unknown_status() {
    // The PATCH body is validated at deserialization time.
    let ok: Result<UpdateApplicationStatusRequest, _> =
        serde_json::from_str(r#"{"status": "offered"}"#);
    assert_eq!(ok.unwrap().status, ApplicationStatus::Offered);

    let bad: Result<UpdateApplicationStatusRequest, _> =
        serde_json::from_str(r#"{"status": "approved"}"#);
    assert!(bad.is_err());
}

#[test]
fn test_default_application_starts_pending() {
    let application = Application::default();
    assert_eq!(application.status, ApplicationStatus::Pending);
}

// --- JSON shapes ---

#[test]
fn test_user_serializes_role_as_string() {
    let user = User {
        role: Role::Employer,
        ..User::default()
    };
    let json = serde_json::to_value(&user).unwrap();
    assert_eq!(json["role"], "employer");
}
