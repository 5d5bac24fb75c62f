use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

pub const CALCULATOR_TAG: &str = "Calculator";
pub const RATE_TAG: &str = "Rates";
pub const APPLICATION_TAG: &str = "Applications";
pub const HEALTH_TAG: &str = "Health";

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Mortgage",
        description = "Mortgage calculation, rate comparison and application API",
    ),
    modifiers(&SecurityAddon),
    components(
        schemas(
            crate::api::dto::ErrorResponse,
            crate::models::RateType,
            crate::models::ApplicationStatus,
        )
    ),
    tags(
        (name = CALCULATOR_TAG, description = "Loan payment calculation"),
        (name = RATE_TAG, description = "Bank mortgage rates and comparison"),
        (name = APPLICATION_TAG, description = "Mortgage applications of the signed-in user"),
        (name = HEALTH_TAG, description = "Health check endpoints"),
    )
)]
pub struct ApiDoc;

pub struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearerAuth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .description(Some("JWT Bearer Token Authentication"))
                    .build(),
            ),
        );
    }
}
