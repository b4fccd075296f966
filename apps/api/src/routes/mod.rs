pub mod health;

use axum::{
    routing::{get, patch, post, put},
    Router,
};

use crate::catalog::handlers as catalog;
use crate::matching::handlers as matching;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Profiles
        .route(
            "/api/v1/professionals",
            post(catalog::handle_register_professional),
        )
        .route("/api/v1/companies", post(catalog::handle_register_company))
        .route("/api/v1/info", put(catalog::handle_edit_info))
        .route(
            "/api/v1/profiles",
            get(catalog::handle_get_profile).delete(catalog::handle_delete_profile),
        )
        .route(
            "/api/v1/professionals/main-resume",
            put(catalog::handle_set_main_resume),
        )
        .route(
            "/api/v1/professionals/status",
            patch(catalog::handle_change_status),
        )
        .route(
            "/api/v1/professionals/resumes",
            get(catalog::handle_list_resumes),
        )
        // Ads
        .route(
            "/api/v1/ads",
            post(catalog::handle_create_ad).get(catalog::handle_search_ads),
        )
        .route(
            "/api/v1/ads/:id",
            get(catalog::handle_get_ad)
                .patch(catalog::handle_update_ad)
                .delete(catalog::handle_delete_ad),
        )
        .route(
            "/api/v1/ads/:id/skills",
            post(catalog::handle_add_ad_skill).delete(catalog::handle_remove_ad_skill),
        )
        // Skills
        .route(
            "/api/v1/skills",
            post(catalog::handle_create_skill)
                .get(catalog::handle_list_skills)
                .patch(catalog::handle_rename_skill)
                .delete(catalog::handle_delete_skill),
        )
        // Matching
        .route("/api/v1/matches/propose", post(matching::handle_propose))
        .route("/api/v1/matches", get(matching::handle_list_matches))
        .route("/api/v1/matches/approve", patch(matching::handle_approve))
        .with_state(state)
}
