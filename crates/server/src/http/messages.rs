//! User-facing messages in every supported locale.

use lectern_core::Locale;

/// A message shown to API clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Message {
    MaterialUnavailable,
    ResolutionFailed,
    QuestionRequired,
    ReferenceRequired,
    InvalidRequest,
    ServiceMisconfigured,
    GenerationFailed,
    ReferenceUnreachable,
    SignInRequired,
    Forbidden,
    NotOwner,
    InvalidUpload,
    InvalidCredentials,
    InvalidEnrollmentCode,
    EmailTaken,
    InvalidInput,
    StudentsOnly,
    UnknownOperation,
    StorageDeleteFailed,
    LinkInvalid,
    LinkExpired,
    FileMissing,
    Internal,
}

impl Message {
    pub fn text(self, locale: Locale) -> &'static str {
        match locale {
            Locale::Ar => self.arabic(),
            Locale::En => self.english(),
        }
    }

    fn arabic(self) -> &'static str {
        match self {
            Self::MaterialUnavailable => "المادة غير متاحة.",
            Self::ResolutionFailed => "تعذر الوصول إلى ملف المادة. حاول مرة أخرى لاحقًا.",
            Self::QuestionRequired => "السؤال مطلوب.",
            Self::ReferenceRequired => "رابط الملف مطلوب.",
            Self::InvalidRequest => "الطلب غير صالح.",
            Self::ServiceMisconfigured => "خدمة الإجابة غير مهيأة حاليًا.",
            Self::GenerationFailed => "تعذر الحصول على إجابة من خدمة الذكاء الاصطناعي.",
            Self::ReferenceUnreachable => "رابط الملف غير صالح أو منتهي الصلاحية.",
            Self::SignInRequired => "يجب تسجيل الدخول أولًا.",
            Self::Forbidden => "ليست لديك صلاحية لتنفيذ هذا الإجراء.",
            Self::NotOwner => "لا يمكنك حذف مادة لا تملكها.",
            Self::InvalidUpload => "يرجى إدخال اسم المادة والوصف واختيار ملف.",
            Self::InvalidCredentials => "البريد الإلكتروني أو كلمة المرور غير صحيحة.",
            Self::InvalidEnrollmentCode => "رمز الطالب غير صالح أو مستخدم مسبقًا.",
            Self::EmailTaken => "البريد الإلكتروني مسجل مسبقًا.",
            Self::InvalidInput => "البيانات المدخلة غير صالحة.",
            Self::StudentsOnly => "التسجيل متاح للطلاب فقط.",
            Self::UnknownOperation => "العملية المطلوبة غير معروفة.",
            Self::StorageDeleteFailed => "تم حذف المادة، لكن تعذر حذف الملف من التخزين.",
            Self::LinkInvalid => "رابط الملف غير صالح.",
            Self::LinkExpired => "انتهت صلاحية رابط الملف.",
            Self::FileMissing => "الملف غير موجود.",
            Self::Internal => "حدث خطأ غير متوقع.",
        }
    }

    fn english(self) -> &'static str {
        match self {
            Self::MaterialUnavailable => "Material unavailable.",
            Self::ResolutionFailed => "Could not access the material file. Please try again later.",
            Self::QuestionRequired => "A question is required.",
            Self::ReferenceRequired => "A file link (fileUrl) is required.",
            Self::InvalidRequest => "Invalid request.",
            Self::ServiceMisconfigured => "The answer service is not configured.",
            Self::GenerationFailed => "Failed to get a response from the AI service.",
            Self::ReferenceUnreachable => "The file link is invalid or has expired.",
            Self::SignInRequired => "Please sign in first.",
            Self::Forbidden => "You are not allowed to do this.",
            Self::NotOwner => "You can only delete your own materials.",
            Self::InvalidUpload => "Please provide a subject name, a description and a file.",
            Self::InvalidCredentials => "Invalid email or password.",
            Self::InvalidEnrollmentCode => "The student code is invalid or already used.",
            Self::EmailTaken => "This email is already registered.",
            Self::InvalidInput => "The submitted data is invalid.",
            Self::StudentsOnly => "Sign-up is open to students only.",
            Self::UnknownOperation => "Unknown operation.",
            Self::StorageDeleteFailed => "The material was deleted, but its file could not be removed from storage.",
            Self::LinkInvalid => "Invalid file link.",
            Self::LinkExpired => "The file link has expired.",
            Self::FileMissing => "File not found.",
            Self::Internal => "Something went wrong.",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_locale_is_arabic() {
        assert_eq!(Message::MaterialUnavailable.text(Locale::default()), "المادة غير متاحة.");
    }

    #[test]
    fn test_english_messages() {
        assert_eq!(Message::MaterialUnavailable.text(Locale::En), "Material unavailable.");
        assert!(Message::StorageDeleteFailed.text(Locale::En).contains("deleted"));
    }
}
