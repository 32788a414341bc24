use crate::{
    classify::{ClassifyOptions, ClassifyPipeline, ClassifyResult},
    models::ModelKind,
    utils::error::WayangError,
    web::extractors::{RequestId, ValidatedJson},
    Config, Result,
};
use axum::{
    extract::{Multipart, State},
    response::Json,
};
use serde::{Deserialize, Serialize};
use std::time::Instant;

/// JSON请求体（base64模式）
#[derive(Debug, Deserialize)]
pub struct ClassifyJsonRequest {
    /// Base64编码的图像数据
    pub image: String,

    /// 参与预测的模型；缺省时使用默认选择
    #[serde(default)]
    pub models: Option<Vec<ModelKind>>,
}

/// JSON响应格式
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ApiError>,
    pub timestamp: String,
    pub request_id: String,
}

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub code: String,
    pub message: String,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T, request_id: String) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            timestamp: chrono::Utc::now().to_rfc3339(),
            request_id,
        }
    }

    pub fn error(code: String, message: String, request_id: String) -> ApiResponse<()> {
        ApiResponse {
            success: false,
            data: None,
            error: Some(ApiError { code, message }),
            timestamp: chrono::Utc::now().to_rfc3339(),
            request_id,
        }
    }
}

/// JSON base64上传处理器
pub async fn classify_json_handler(
    State(config): State<Config>,
    RequestId(request_id): RequestId,
    ValidatedJson(request): ValidatedJson<ClassifyJsonRequest>,
) -> Result<Json<ApiResponse<ClassifyResult>>> {
    let start_time = Instant::now();

    tracing::info!(
        "Processing JSON classify request: request_id={}, models={:?}",
        request_id,
        request.models
    );

    // base64编码约膨胀4/3，先做粗略预检，解码后还会精确校验
    let max_encoded = config.server_config.max_request_size / 3 * 4 + 4;
    if request.image.len() > max_encoded {
        return Err(WayangError::FileTooLarge(request.image.len(), max_encoded));
    }

    let options = match request.models {
        Some(models) => ClassifyOptions { models },
        None => ClassifyOptions::default(),
    };

    let result = ClassifyPipeline::process_base64(&request.image, options).await?;

    tracing::info!(
        "JSON classify completed: request_id={}, predictions={}, time={:.3}s",
        request_id,
        result.predictions.len(),
        start_time.elapsed().as_secs_f32()
    );

    Ok(Json(ApiResponse::success(result, request_id)))
}

/// Multipart文件上传处理器
pub async fn classify_upload_handler(
    State(config): State<Config>,
    RequestId(request_id): RequestId,
    mut multipart: Multipart,
) -> Result<Json<ApiResponse<ClassifyResult>>> {
    let start_time = Instant::now();

    tracing::info!("Processing multipart classify request: request_id={}", request_id);

    let mut image_data: Option<axum::body::Bytes> = None;
    let mut models: Vec<ModelKind> = Vec::new();

    // 解析multipart数据
    while let Some(field) = multipart.next_field().await.map_err(|e| {
        WayangError::InvalidInput(format!("Failed to read multipart field: {}", e))
    })? {
        let field_name = field.name().unwrap_or("unknown").to_string();

        match field_name.as_str() {
            "file" => {
                if let Some(content_type) = field.content_type() {
                    if !content_type.starts_with("image/") {
                        return Err(WayangError::UnsupportedFormat(content_type.to_string()));
                    }
                }

                let data = field.bytes().await.map_err(|e| {
                    WayangError::InvalidInput(format!("Failed to read file data: {}", e))
                })?;

                if data.is_empty() {
                    return Err(WayangError::InvalidInput("Empty file".to_string()));
                }

                if data.len() > config.server_config.max_request_size {
                    return Err(WayangError::FileTooLarge(
                        data.len(),
                        config.server_config.max_request_size,
                    ));
                }

                tracing::debug!("Received file: {} bytes", data.len());
                image_data = Some(data);
            }
            // 可以重复出现，也可以是逗号分隔的列表
            "models" => {
                let value = field.text().await.unwrap_or_default();
                for part in value.split(',').filter(|s| !s.trim().is_empty()) {
                    models.push(part.parse::<ModelKind>()?);
                }
            }
            _ => {
                tracing::debug!("Ignoring unknown field: {}", field_name);
            }
        }
    }

    let image_data = image_data
        .ok_or_else(|| WayangError::InvalidInput("No image file provided".to_string()))?;

    let options = if models.is_empty() {
        ClassifyOptions::default()
    } else {
        ClassifyOptions { models }
    };

    let result = ClassifyPipeline::process_bytes(image_data, options).await?;

    tracing::info!(
        "Upload classify completed: request_id={}, predictions={}, time={:.3}s",
        request_id,
        result.predictions.len(),
        start_time.elapsed().as_secs_f32()
    );

    Ok(Json(ApiResponse::success(result, request_id)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_request_without_models_defaults_to_none() {
        let request: ClassifyJsonRequest = serde_json::from_str(r#"{"image":"abcd"}"#).unwrap();
        assert_eq!(request.image, "abcd");
        assert!(request.models.is_none());
    }

    #[test]
    fn json_request_parses_model_aliases() {
        let request: ClassifyJsonRequest =
            serde_json::from_str(r#"{"image":"abcd","models":["deit","efficientnetv2s"]}"#)
                .unwrap();
        assert_eq!(
            request.models,
            Some(vec![ModelKind::DeitSmall, ModelKind::EfficientNetV2S])
        );
    }

    #[test]
    fn unknown_model_is_a_deserialize_error() {
        let result: std::result::Result<ClassifyJsonRequest, _> =
            serde_json::from_str(r#"{"image":"abcd","models":["resnet"]}"#);
        assert!(result.is_err());
    }

    #[test]
    fn success_response_carries_request_id() {
        let response = ApiResponse::success(42, "req-1".to_string());
        assert!(response.success);
        assert_eq!(response.data, Some(42));
        assert_eq!(response.request_id, "req-1");
        assert!(response.error.is_none());
    }
}
