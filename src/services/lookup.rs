use futures::future::join_all;

use crate::{
    clients::upstream::UpstreamClient,
    models::{
        notice::{Notice, View},
        student::{AuthorizedGuardian, StudentSummary},
    },
};

/// Notice shown when the upstream credential exchange fails during a search.
pub const SEARCH_AUTH_ERROR: &str =
    "Authentication with the school system failed. Check the API credentials.";
/// Notice shown when the upstream credential exchange fails during a detail lookup.
pub const DETAILS_AUTH_ERROR: &str = "Authentication error while fetching student details.";

/// Searches students by name.
///
/// Never fails: every upstream problem becomes a notice next to an empty list.
pub async fn search_students(client: &UpstreamClient, name: &str) -> View<Vec<StudentSummary>> {
    let name = name.trim();
    if name.is_empty() {
        return View::with_notice(Vec::new(), Notice::warning("Please type a name to search."));
    }

    let token = match client.authenticate().await {
        Ok(token) => token,
        Err(e) => {
            tracing::warn!("❌ Search aborted: {}", e);
            return View::with_notice(Vec::new(), Notice::danger(SEARCH_AUTH_ERROR));
        }
    };

    match client.search_students(&token, name).await {
        Ok(students) if students.is_empty() => {
            tracing::info!("🔍 No students matching {:?}", name);
            View::with_notice(
                students,
                Notice::info(format!("No students found matching \"{}\".", name)),
            )
        }
        Ok(students) => {
            tracing::info!("🔍 {} students matching {:?}", students.len(), name);
            View::new(students)
        }
        Err(e) => {
            tracing::warn!("❌ Student search failed: {}", e);
            View::with_notice(
                Vec::new(),
                Notice::danger(format!("Student search failed: {}", e)),
            )
        }
    }
}

/// Fetches the student a checkout is being started for.
///
/// `Err` carries the notice to show after redirecting back to the search view.
pub async fn student_for_checkout(
    client: &UpstreamClient,
    student_id: i64,
) -> Result<StudentSummary, Notice> {
    let token = client.authenticate().await.map_err(|e| {
        tracing::warn!("❌ Checkout start aborted: {}", e);
        Notice::danger("Authentication error.")
    })?;

    Ok(client.get_student(&token, student_id).await)
}

/// Lists the guardians authorized to pick up a student, with photos when available.
///
/// `Err` means authentication failed and the caller should return to the search
/// view with the notice. A failed listing yields an empty list and a notice.
pub async fn authorized_guardians(
    client: &UpstreamClient,
    student_id: i64,
) -> Result<View<Vec<AuthorizedGuardian>>, Notice> {
    let token = client.authenticate().await.map_err(|e| {
        tracing::warn!("❌ Guardian lookup aborted: {}", e);
        Notice::danger(DETAILS_AUTH_ERROR)
    })?;

    let guardians = match client.get_authorized_guardians(&token, student_id).await {
        Ok(guardians) => guardians,
        Err(e) => {
            tracing::warn!("❌ Guardian listing for student {} failed: {}", student_id, e);
            return Ok(View::with_notice(
                Vec::new(),
                Notice::danger(format!("Failed to fetch student details: {}", e)),
            ));
        }
    };

    // join_all yields results in input order.
    let enriched = join_all(guardians.into_iter().map(|mut guardian| {
        let token = &token;
        async move {
            if let Some(code) = guardian.code.as_deref() {
                guardian.photo_uri = client.get_guardian_photo(token, code).await;
            }
            guardian
        }
    }))
    .await;

    tracing::info!(
        "👪 Student {}: {} authorized guardians",
        student_id,
        enriched.len()
    );

    Ok(View::new(enriched))
}
