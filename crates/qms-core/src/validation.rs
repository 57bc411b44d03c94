//! 表单字段验证
//!
//! 各页面录入数据在写库前的统一校验规则。

use regex::Regex;
use std::sync::OnceLock;

fn email_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email regex"))
}

fn phone_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(\+20|0)?1[0-2]\d{8}$").expect("phone regex"))
}

fn national_id_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\d{14}$").expect("national id regex"))
}

fn time_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^([0-1]?[0-9]|2[0-3]):[0-5][0-9]$").expect("time regex"))
}

/// 验证电子邮箱格式
pub fn validate_email(email: &str) -> bool {
    email_re().is_match(email)
}

/// 验证手机号（埃及格式）
pub fn validate_phone(phone: &str) -> bool {
    let stripped: String = phone.chars().filter(|c| !c.is_whitespace()).collect();
    phone_re().is_match(&stripped)
}

/// 验证身份证号（埃及格式，14位数字）
pub fn validate_national_id(id: &str) -> bool {
    national_id_re().is_match(id)
}

/// 验证密码强度：至少8位，含大小写字母和数字
pub fn validate_password(password: &str) -> bool {
    password.len() >= 8
        && password.chars().any(|c| c.is_ascii_lowercase())
        && password.chars().any(|c| c.is_ascii_uppercase())
        && password.chars().any(|c| c.is_ascii_digit())
}

/// 验证阿拉伯语文本及长度范围
pub fn validate_arabic_text(text: &str, min_len: usize, max_len: usize) -> bool {
    let chars = text.chars().count();
    if chars < min_len || chars > max_len {
        return false;
    }
    text.chars().all(|c| {
        ('\u{0600}'..='\u{06FF}').contains(&c)
            || c.is_whitespace()
            || c.is_ascii_digit()
            || matches!(c, '-' | '.' | ',' | '!' | '?' | '(' | ')')
    })
}

/// 验证姓名（阿拉伯字母、空格、连字符）
pub fn validate_name(name: &str, min_len: usize, max_len: usize) -> bool {
    let chars = name.chars().count();
    chars >= min_len
        && chars <= max_len
        && name.chars().all(|c| {
            ('\u{0600}'..='\u{06FF}').contains(&c)
                || c.is_whitespace()
                || matches!(c, '-' | '\'')
        })
}

/// 验证时间格式（HH:MM）
pub fn validate_time(time: &str) -> bool {
    time_re().is_match(time)
}

/// 验证数值范围
pub fn validate_number(value: i64, min: Option<i64>, max: Option<i64>) -> bool {
    if let Some(min) = min {
        if value < min {
            return false;
        }
    }
    if let Some(max) = max {
        if value > max {
            return false;
        }
    }
    true
}

/// 单个字段的验证错误
#[derive(Debug, Clone, serde::Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: &str, message: &str) -> Self {
        Self {
            field: field.to_string(),
            message: message.to_string(),
        }
    }
}

/// 表单验证结果
#[derive(Debug, Clone, serde::Serialize)]
pub struct ValidationReport {
    pub is_valid: bool,
    pub errors: Vec<FieldError>,
}

impl ValidationReport {
    pub fn from_errors(errors: Vec<FieldError>) -> Self {
        Self {
            is_valid: errors.is_empty(),
            errors,
        }
    }
}

/// 验证诊所表单
pub fn validate_clinic_form(name: &str, clinic_number: i32, password: &str) -> ValidationReport {
    let mut errors = Vec::new();

    if !validate_name(name, 2, 255) {
        errors.push(FieldError::new("name", "اسم العيادة غير صحيح"));
    }
    if clinic_number < 1 {
        errors.push(FieldError::new("clinic_number", "رقم العيادة غير صحيح"));
    }
    if password.chars().count() < 4 {
        errors.push(FieldError::new(
            "password",
            "كلمة المرور يجب أن تكون 4 أحرف على الأقل",
        ));
    }

    ValidationReport::from_errors(errors)
}

/// 验证医生表单
pub fn validate_doctor_form(
    name: &str,
    phone: &str,
    national_id: &str,
    specialty: &str,
) -> ValidationReport {
    let mut errors = Vec::new();

    if !validate_name(name, 2, 255) {
        errors.push(FieldError::new("name", "اسم الطبيب غير صحيح"));
    }
    if !validate_phone(phone) {
        errors.push(FieldError::new("phone", "رقم الهاتف غير صحيح"));
    }
    if !validate_national_id(national_id) {
        errors.push(FieldError::new("national_id", "الرقم القومي يجب أن يكون 14 رقم"));
    }
    if !validate_arabic_text(specialty, 2, 100) {
        errors.push(FieldError::new("specialty", "التخصص غير صحيح"));
    }

    ValidationReport::from_errors(errors)
}

/// 验证预约表单（日期时效在查询层结合当前时间判断）
pub fn validate_appointment_form(
    patient_name: &str,
    national_id: &str,
    phone: &str,
    appointment_time: &str,
    visit_reason: &str,
) -> ValidationReport {
    let mut errors = Vec::new();

    if !validate_name(patient_name, 2, 255) {
        errors.push(FieldError::new("patient_name", "اسم المريض غير صحيح"));
    }
    if !validate_national_id(national_id) {
        errors.push(FieldError::new("national_id", "الرقم القومي يجب أن يكون 14 رقم"));
    }
    if !validate_phone(phone) {
        errors.push(FieldError::new("phone", "رقم الهاتف غير صحيح"));
    }
    if !validate_time(appointment_time) {
        errors.push(FieldError::new("appointment_time", "الوقت غير صحيح"));
    }
    if !validate_arabic_text(visit_reason, 5, 500) {
        errors.push(FieldError::new("visit_reason", "سبب الزيارة غير صحيح"));
    }

    ValidationReport::from_errors(errors)
}

/// 验证投诉表单
pub fn validate_complaint_form(
    message: &str,
    phone: Option<&str>,
    email: Option<&str>,
) -> ValidationReport {
    let mut errors = Vec::new();

    if !validate_arabic_text(message, 140, 1000) {
        errors.push(FieldError::new(
            "message",
            "النص يجب أن يكون بين 140 و 1000 حرف",
        ));
    }
    if let Some(phone) = phone {
        if !validate_phone(phone) {
            errors.push(FieldError::new("phone", "رقم الهاتف غير صحيح"));
        }
    }
    if let Some(email) = email {
        if !validate_email(email) {
            errors.push(FieldError::new("email", "البريد الإلكتروني غير صحيح"));
        }
    }

    ValidationReport::from_errors(errors)
}

/// 验证问诊表单
pub fn validate_consultation_form(
    complaint_text: &str,
    current_symptoms: &str,
    specialty_required: &str,
) -> ValidationReport {
    let mut errors = Vec::new();

    if !validate_arabic_text(complaint_text, 10, 1000) {
        errors.push(FieldError::new("complaint_text", "نص الشكوى غير صحيح"));
    }
    if !validate_arabic_text(current_symptoms, 10, 1000) {
        errors.push(FieldError::new("current_symptoms", "الأعراض الحالية غير صحيحة"));
    }
    if !validate_arabic_text(specialty_required, 2, 100) {
        errors.push(FieldError::new("specialty_required", "التخصص المطلوب غير صحيح"));
    }

    ValidationReport::from_errors(errors)
}

/// 验证患者登记表单
pub fn validate_patient_form(
    full_name: &str,
    national_id: &str,
    phone: &str,
    family_members: i32,
) -> ValidationReport {
    let mut errors = Vec::new();

    if !validate_name(full_name, 4, 50) {
        errors.push(FieldError::new("full_name", "الاسم الرباعي غير صحيح"));
    }
    if !validate_national_id(national_id) {
        errors.push(FieldError::new("national_id", "الرقم القومي يجب أن يكون 14 رقم"));
    }
    if !validate_phone(phone) {
        errors.push(FieldError::new("phone", "رقم الهاتف يجب أن يكون 11 رقم"));
    }
    if !validate_number(family_members as i64, Some(0), Some(10)) {
        errors.push(FieldError::new("family_members", "عدد أفراد الأسرة غير صحيح"));
    }

    ValidationReport::from_errors(errors)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_phone() {
        assert!(validate_phone("01012345678"));
        assert!(validate_phone("+201112345678"));
        assert!(validate_phone("010 1234 5678"));
        assert!(!validate_phone("01312345678"));
        assert!(!validate_phone("12345"));
    }

    #[test]
    fn test_validate_national_id() {
        assert!(validate_national_id("29801011234567"));
        assert!(!validate_national_id("2980101123456"));
        assert!(!validate_national_id("2980101123456a"));
    }

    #[test]
    fn test_validate_password() {
        assert!(validate_password("Abcdef12"));
        assert!(!validate_password("abcdef12"));
        assert!(!validate_password("Ab1"));
    }

    #[test]
    fn test_validate_arabic_text() {
        assert!(validate_arabic_text("ألم في الصدر منذ يومين", 5, 100));
        assert!(!validate_arabic_text("chest pain", 5, 100));
        assert!(!validate_arabic_text("ألم", 5, 100));
    }

    #[test]
    fn test_validate_clinic_form() {
        let report = validate_clinic_form("الأسنان", 3, "1234");
        assert!(report.is_valid);

        let report = validate_clinic_form("الأسنان", 0, "12");
        assert!(!report.is_valid);
        assert_eq!(report.errors.len(), 2);
    }

    #[test]
    fn test_validate_complaint_length_bounds() {
        let long_message = "شكوى ".repeat(40);
        assert!(validate_complaint_form(&long_message, None, None).is_valid);
        assert!(!validate_complaint_form("قصير", None, None).is_valid);
    }
}
