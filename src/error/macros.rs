//! # 错误处理宏

/// 快速创建参数校验错误的宏
#[macro_export]
macro_rules! validation_error {
    ($msg:expr) => {
        $crate::error::AuthModuleError::validation($msg)
    };
    ($fmt:expr, $($arg:tt)*) => {
        $crate::error::AuthModuleError::validation(format!($fmt, $($arg)*))
    };
}

/// 快速创建资源未找到错误的宏
#[macro_export]
macro_rules! not_found_error {
    ($msg:expr) => {
        $crate::error::AuthModuleError::not_found($msg)
    };
    ($fmt:expr, $($arg:tt)*) => {
        $crate::error::AuthModuleError::not_found(format!($fmt, $($arg)*))
    };
}

/// 快速创建配置错误的宏
#[macro_export]
macro_rules! configuration_error {
    ($msg:expr) => {
        $crate::error::AuthModuleError::configuration($msg)
    };
    ($fmt:expr, $($arg:tt)*) => {
        $crate::error::AuthModuleError::configuration(format!($fmt, $($arg)*))
    };
}

/// 确保条件成立，否则返回参数校验错误
#[macro_export]
macro_rules! ensure_valid {
    ($cond:expr, $msg:expr) => {
        if !($cond) {
            return Err($crate::validation_error!($msg));
        }
    };
    ($cond:expr, $fmt:expr, $($arg:tt)*) => {
        if !($cond) {
            return Err($crate::validation_error!($fmt, $($arg)*));
        }
    };
}
