use actix_web::{HttpResponse, Responder, get, web};
use serde::{Deserialize, Serialize};

use super::{ErrorResponse, ErrorResponseWithMessage};
use crate::harness::starter_code;
use crate::language::Language;
use crate::orchestrator::Orchestrator;

#[derive(Serialize, Deserialize, Debug)]
pub struct ProblemSummary {
    pub id: String,
    pub name: String,
    pub case_count: usize,
    pub languages: Vec<Language>,
}

#[derive(Deserialize)]
pub struct StarterQuery {
    pub language: String,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct StarterCode {
    pub problem_id: String,
    pub language: Language,
    pub code: String,
}

#[get("/problems")]
pub async fn get_problems_handler(orchestrator: web::Data<Orchestrator>) -> impl Responder {
    let languages: Vec<Language> = orchestrator.languages().iter().map(|l| l.name).collect();
    let summaries: Vec<ProblemSummary> = orchestrator
        .problems()
        .iter()
        .map(|p| ProblemSummary {
            id: p.id.clone(),
            name: p.name.clone(),
            case_count: p.cases.len(),
            languages: languages.clone(),
        })
        .collect();

    HttpResponse::Ok().json(summaries)
}

#[get("/problems/{id}/starter")]
pub async fn get_starter_handler(
    orchestrator: web::Data<Orchestrator>,
    path: web::Path<(String,)>,
    query: web::Query<StarterQuery>,
) -> impl Responder {
    let problem_id = path.into_inner().0;

    let language = match query.language.parse::<Language>() {
        Ok(language) => language,
        Err(message) => {
            return HttpResponse::BadRequest().json(ErrorResponseWithMessage {
                reason: "ERR_INVALID_ARGUMENT",
                code: 1,
                message,
            });
        }
    };

    let Some(problem) = orchestrator.find_problem(&problem_id) else {
        return HttpResponse::NotFound().json(ErrorResponse::NOT_FOUND);
    };
    if orchestrator.find_language(language).is_none() {
        return HttpResponse::NotFound().json(ErrorResponse::NOT_FOUND);
    }

    HttpResponse::Ok().json(StarterCode {
        problem_id,
        language,
        code: starter_code(&problem.entry, language),
    })
}
