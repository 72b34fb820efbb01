use axum::http::StatusCode;
use talent_bridge::{
    auth::AuthUser,
    models::{Application, ApplicationStatus, Job, Role},
    policy::{
        self, ApplicationScope, can_view_application, ensure_admin, ensure_job_owner,
        ensure_seeker, ensure_status_writer, ensure_withdraw_owner, ensure_withdrawable,
    },
};
use uuid::Uuid;

fn caller(role: Role) -> AuthUser {
    AuthUser {
        id: Uuid::new_v4(),
        role,
    }
}

fn job_owned_by(employer_id: Uuid) -> Job {
    Job {
        id: Uuid::new_v4(),
        employer_id,
        ..Job::default()
    }
}

fn application_by(applicant_id: Uuid, job_id: Uuid, status: ApplicationStatus) -> Application {
    Application {
        id: Uuid::new_v4(),
        job_id,
        applicant_id,
        status,
        ..Application::default()
    }
}

#[test]
fn test_scope_derivation_is_fail_closed() {
    let admin = caller(Role::Admin);
    let seeker = caller(Role::Seeker);
    let employer = caller(Role::Employer);

    assert_eq!(
        ApplicationScope::for_caller(Some(&admin)),
        ApplicationScope::All
    );
    assert_eq!(
        ApplicationScope::for_caller(Some(&seeker)),
        ApplicationScope::Applicant(seeker.id)
    );
    assert_eq!(
        ApplicationScope::for_caller(Some(&employer)),
        ApplicationScope::JobOwner(employer.id)
    );
    // No identity: empty window, not an error.
    assert_eq!(ApplicationScope::for_caller(None), ApplicationScope::None);
}

#[test]
fn test_only_seekers_may_apply() {
    assert!(ensure_seeker(&caller(Role::Seeker)).is_ok());

    for role in [Role::Admin, Role::Employer] {
        let err = ensure_seeker(&caller(role)).unwrap_err();
        assert_eq!(err.status_code(), StatusCode::FORBIDDEN);
    }
}

#[test]
fn test_job_ownership_with_admin_override() {
    let owner = caller(Role::Employer);
    let job = job_owned_by(owner.id);

    assert!(ensure_job_owner(&owner, &job).is_ok());
    assert!(ensure_job_owner(&caller(Role::Admin), &job).is_ok());

    assert!(ensure_job_owner(&caller(Role::Employer), &job).is_err());
    assert!(ensure_job_owner(&caller(Role::Seeker), &job).is_err());
}

#[test]
fn test_status_writer_rules() {
    let owner = caller(Role::Employer);
    let job = job_owned_by(owner.id);

    assert!(ensure_status_writer(&owner, &job).is_ok());
    assert!(ensure_status_writer(&caller(Role::Admin), &job).is_ok());

    // A foreign employer and the applicant's own seeker role are both denied.
    let err = ensure_status_writer(&caller(Role::Employer), &job).unwrap_err();
    assert_eq!(err.status_code(), StatusCode::FORBIDDEN);
    let err = ensure_status_writer(&caller(Role::Seeker), &job).unwrap_err();
    assert_eq!(err.status_code(), StatusCode::FORBIDDEN);
}

#[test]
fn test_withdraw_ownership() {
    let seeker = caller(Role::Seeker);
    let job = job_owned_by(Uuid::new_v4());
    let application = application_by(seeker.id, job.id, ApplicationStatus::Pending);

    assert!(ensure_withdraw_owner(&seeker, &application).is_ok());

    // Another seeker, the employer, even an admin: withdrawal is strictly
    // the applicant's transition.
    for other in [Role::Seeker, Role::Employer, Role::Admin] {
        assert!(ensure_withdraw_owner(&caller(other), &application).is_err());
    }
}

#[test]
fn test_withdrawable_statuses() {
    for open in [
        ApplicationStatus::Pending,
        ApplicationStatus::Reviewed,
        ApplicationStatus::Interviewed,
        ApplicationStatus::Offered,
    ] {
        assert!(ensure_withdrawable(open).is_ok());
    }

    for terminal in [
        ApplicationStatus::Accepted,
        ApplicationStatus::Rejected,
        ApplicationStatus::Withdrawn,
    ] {
        let err = ensure_withdrawable(terminal).unwrap_err();
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        // The message names the current status for the client.
        assert!(err.to_string().contains(terminal.as_str()));
    }
}

#[test]
fn test_application_visibility_matrix() {
    let seeker = caller(Role::Seeker);
    let employer = caller(Role::Employer);
    let job = job_owned_by(employer.id);
    let application = application_by(seeker.id, job.id, ApplicationStatus::Pending);

    assert!(can_view_application(&seeker, &application, &job));
    assert!(can_view_application(&employer, &application, &job));
    assert!(can_view_application(&caller(Role::Admin), &application, &job));

    assert!(!can_view_application(&caller(Role::Seeker), &application, &job));
    assert!(!can_view_application(&caller(Role::Employer), &application, &job));
}

#[test]
fn test_review_gate_requires_acceptance() {
    assert!(policy::ensure_review_eligible(true).is_ok());

    let err = policy::ensure_review_eligible(false).unwrap_err();
    // Authorization failure, not validation: the caller is ineligible
    // regardless of input shape.
    assert_eq!(err.status_code(), StatusCode::FORBIDDEN);
}

#[test]
fn test_admin_gate() {
    assert!(ensure_admin(&caller(Role::Admin)).is_ok());
    assert!(ensure_admin(&caller(Role::Employer)).is_err());
    assert!(ensure_admin(&caller(Role::Seeker)).is_err());
}
