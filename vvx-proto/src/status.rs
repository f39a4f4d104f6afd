/// Application status reported in the `Status` field of a REST response.
#[derive(Debug, PartialEq, Clone, Copy)]
pub enum ApiStatus {
    Success,
    DeviceBusy,
    LineNotRegistered,
    OperationNotAllowed,
    OperationNotSupported,
    LineDoesNotExist,
    UrlsNotConfigured,
    CallDoesNotExist,
    ConfigurationExportFailed,
    InputSizeLimitExceeded,
    DefaultPasswordNotAllowed,
    FailedToProcessRequest,
}

impl ApiStatus {
    pub const SUCCESS_CODE: i64 = 2000;
    pub const DEVICE_BUSY_CODE: i64 = 4001;
    pub const LINE_NOT_REGISTERED_CODE: i64 = 4002;
    pub const OPERATION_NOT_ALLOWED_CODE: i64 = 4003;
    pub const OPERATION_NOT_SUPPORTED_CODE: i64 = 4004;
    pub const LINE_DOES_NOT_EXIST_CODE: i64 = 4005;
    pub const URLS_NOT_CONFIGURED_CODE: i64 = 4006;
    pub const CALL_DOES_NOT_EXIST_CODE: i64 = 4007;
    pub const CONFIGURATION_EXPORT_FAILED_CODE: i64 = 4008;
    pub const INPUT_SIZE_LIMIT_EXCEEDED_CODE: i64 = 4009;
    pub const DEFAULT_PASSWORD_NOT_ALLOWED_CODE: i64 = 4010;
    pub const FAILED_TO_PROCESS_REQUEST_CODE: i64 = 5000;

    /// `None` for codes the phone is not documented to send.
    pub fn from_code(code: i64) -> Option<Self> {
        let status = match code {
            Self::SUCCESS_CODE => ApiStatus::Success,
            Self::DEVICE_BUSY_CODE => ApiStatus::DeviceBusy,
            Self::LINE_NOT_REGISTERED_CODE => ApiStatus::LineNotRegistered,
            Self::OPERATION_NOT_ALLOWED_CODE => ApiStatus::OperationNotAllowed,
            Self::OPERATION_NOT_SUPPORTED_CODE => ApiStatus::OperationNotSupported,
            Self::LINE_DOES_NOT_EXIST_CODE => ApiStatus::LineDoesNotExist,
            Self::URLS_NOT_CONFIGURED_CODE => ApiStatus::UrlsNotConfigured,
            Self::CALL_DOES_NOT_EXIST_CODE => ApiStatus::CallDoesNotExist,
            Self::CONFIGURATION_EXPORT_FAILED_CODE => ApiStatus::ConfigurationExportFailed,
            Self::INPUT_SIZE_LIMIT_EXCEEDED_CODE => ApiStatus::InputSizeLimitExceeded,
            Self::DEFAULT_PASSWORD_NOT_ALLOWED_CODE => ApiStatus::DefaultPasswordNotAllowed,
            Self::FAILED_TO_PROCESS_REQUEST_CODE => ApiStatus::FailedToProcessRequest,
            _ => return None,
        };
        Some(status)
    }

    pub fn code(&self) -> i64 {
        match self {
            ApiStatus::Success => Self::SUCCESS_CODE,
            ApiStatus::DeviceBusy => Self::DEVICE_BUSY_CODE,
            ApiStatus::LineNotRegistered => Self::LINE_NOT_REGISTERED_CODE,
            ApiStatus::OperationNotAllowed => Self::OPERATION_NOT_ALLOWED_CODE,
            ApiStatus::OperationNotSupported => Self::OPERATION_NOT_SUPPORTED_CODE,
            ApiStatus::LineDoesNotExist => Self::LINE_DOES_NOT_EXIST_CODE,
            ApiStatus::UrlsNotConfigured => Self::URLS_NOT_CONFIGURED_CODE,
            ApiStatus::CallDoesNotExist => Self::CALL_DOES_NOT_EXIST_CODE,
            ApiStatus::ConfigurationExportFailed => Self::CONFIGURATION_EXPORT_FAILED_CODE,
            ApiStatus::InputSizeLimitExceeded => Self::INPUT_SIZE_LIMIT_EXCEEDED_CODE,
            ApiStatus::DefaultPasswordNotAllowed => Self::DEFAULT_PASSWORD_NOT_ALLOWED_CODE,
            ApiStatus::FailedToProcessRequest => Self::FAILED_TO_PROCESS_REQUEST_CODE,
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            ApiStatus::Success => "Success",
            ApiStatus::DeviceBusy => "Device busy",
            ApiStatus::LineNotRegistered => "Line not registered",
            ApiStatus::OperationNotAllowed => "Operation not allowed",
            ApiStatus::OperationNotSupported => "Operation not supported",
            ApiStatus::LineDoesNotExist => "Line does not exist",
            ApiStatus::UrlsNotConfigured => "URLs not configured",
            ApiStatus::CallDoesNotExist => "Call does not exist",
            ApiStatus::ConfigurationExportFailed => "Configuration export failed",
            ApiStatus::InputSizeLimitExceeded => "Input size limit exceeded",
            ApiStatus::DefaultPasswordNotAllowed => "Default password not allowed to change",
            ApiStatus::FailedToProcessRequest => "Failed to process request",
        }
    }

    pub fn is_success(&self) -> bool {
        *self == ApiStatus::Success
    }
}
