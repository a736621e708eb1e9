use actix_web::{HttpResponse, Responder, post, web};
use serde::{Deserialize, Serialize};

use super::ErrorResponse;
use crate::create_timestamp;
use crate::language::Language;
use crate::orchestrator::Orchestrator;
use crate::verdict::ExecutionResult;

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Submission {
    pub source_code: String,
    pub problem_id: String,
    pub language: String,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct SubmissionRecord {
    pub created_time: String,
    pub updated_time: String,
    pub submission: Submission,
    pub result: ExecutionResult,
}

/// Judges the submission and answers with its verdict once the sandbox is done
#[post("/submissions")]
pub async fn post_submission_handler(
    orchestrator: web::Data<Orchestrator>,
    body: web::Json<Submission>,
) -> impl Responder {
    let language = body
        .language
        .parse::<Language>()
        .ok()
        .filter(|l| orchestrator.find_language(*l).is_some());
    let found_problem = orchestrator.find_problem(&body.problem_id).is_some();

    let Some(language) = language.filter(|_| found_problem) else {
        log::info!(
            "Rejected submission for problem {} in {}",
            body.problem_id,
            body.language
        );
        return HttpResponse::NotFound().json(ErrorResponse::NOT_FOUND);
    };

    let created_time = create_timestamp();
    let submission = body.into_inner();
    let result = orchestrator
        .submit(&submission.source_code, &submission.problem_id, language)
        .await;

    HttpResponse::Ok().json(SubmissionRecord {
        created_time,
        updated_time: create_timestamp(),
        submission,
        result,
    })
}
