use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "tubegrab extraction API",
        version = "0.1.0",
        description = "Resolve YouTube metadata and relay audio-only renditions",
    ),
    paths(
        crate::api_rest::video_info,
        crate::api_rest::download,
    ),
    components(
        schemas(
            crate::models::MediaSummary,
            crate::api_rest::VideoInfoRequest,
            crate::api_rest::ErrorResponse,
        )
    ),
    tags(
        (name = "extract", description = "YouTube metadata and audio extraction")
    )
)]
pub struct ApiDoc;
