use actix_web::{HttpResponse, Responder, get, post, web};
use log::warn;

use super::models::{AppState, RegisterValidatorRequest, RegisterValidatorResponse, ValidatorsResponse};

#[get("/validators/")]
pub async fn list_validators(state: web::Data<AppState>) -> impl Responder {
    let validators = state.engine.validators();
    let active = validators.iter().filter(|v| v.is_eligible()).count();
    HttpResponse::Ok().json(ValidatorsResponse {
        total: validators.len(),
        active,
        validators,
    })
}

/// Register or refresh a validator. An oracle failure still registers it
/// with the default score and is reported as a warning.
#[post("/validators/")]
pub async fn register_validator(
    state: web::Data<AppState>,
    body: web::Json<RegisterValidatorRequest>,
) -> impl Responder {
    let address = body.address.trim().to_string();
    if address.is_empty() {
        return HttpResponse::BadRequest().body("address required");
    }

    let warning = match state.engine.register_validator(&address, body.stake).await {
        Ok(_) => None,
        Err(e) => {
            warn!("POST /validators/ - {} registered with fallback score: {}", address, e);
            Some(e.to_string())
        }
    };
    match state.engine.validator(&address) {
        Some(validator) => HttpResponse::Ok().json(RegisterValidatorResponse { validator, warning }),
        None => HttpResponse::InternalServerError().body("validator missing after registration"),
    }
}
