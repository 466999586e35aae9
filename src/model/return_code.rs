use core::fmt;

/// The exhaustive set of job-level return codes surfaced in
/// `ResultInfo.return_code`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReturnCode {
    Success,
    SuccessWithErrors,
    ReportsWithErrorsExceededThreshold,
    InputDataReadFailed,
    UnsupportedReportVersion,
    InvalidJob,
    PermissionError,
    InternalError,
    PrivacyBudgetExhausted,
    PrivacyBudgetAuthenticationError,
    PrivacyBudgetAuthorizationError,
    ResultWriteError,
    DebugSuccessWithPrivacyBudgetError,
    DebugSuccessWithPrivacyBudgetExhausted,
}

impl ReturnCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReturnCode::Success => "SUCCESS",
            ReturnCode::SuccessWithErrors => "SUCCESS_WITH_ERRORS",
            ReturnCode::ReportsWithErrorsExceededThreshold => {
                "REPORTS_WITH_ERRORS_EXCEEDED_THRESHOLD"
            }
            ReturnCode::InputDataReadFailed => "INPUT_DATA_READ_FAILED",
            ReturnCode::UnsupportedReportVersion => "UNSUPPORTED_REPORT_VERSION",
            ReturnCode::InvalidJob => "INVALID_JOB",
            ReturnCode::PermissionError => "PERMISSION_ERROR",
            ReturnCode::InternalError => "INTERNAL_ERROR",
            ReturnCode::PrivacyBudgetExhausted => "PRIVACY_BUDGET_EXHAUSTED",
            ReturnCode::PrivacyBudgetAuthenticationError => "PRIVACY_BUDGET_AUTHENTICATION_ERROR",
            ReturnCode::PrivacyBudgetAuthorizationError => "PRIVACY_BUDGET_AUTHORIZATION_ERROR",
            ReturnCode::ResultWriteError => "RESULT_WRITE_ERROR",
            ReturnCode::DebugSuccessWithPrivacyBudgetError => {
                "DEBUG_SUCCESS_WITH_PRIVACY_BUDGET_ERROR"
            }
            ReturnCode::DebugSuccessWithPrivacyBudgetExhausted => {
                "DEBUG_SUCCESS_WITH_PRIVACY_BUDGET_EXHAUSTED"
            }
        }
    }
}

impl fmt::Display for ReturnCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
