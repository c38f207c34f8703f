//! Display language, text direction and the notification catalog

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::{Arc, PoisonError, RwLock};

/// Display language of the site and the admin panel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    Ar,
    En,
}

/// Text direction for layout
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Rtl,
    Ltr,
}

impl Language {
    pub fn code(&self) -> &'static str {
        match self {
            Language::Ar => "ar",
            Language::En => "en",
        }
    }

    pub fn direction(&self) -> Direction {
        match self {
            Language::Ar => Direction::Rtl,
            Language::En => Direction::Ltr,
        }
    }

    pub fn other(&self) -> Language {
        match self {
            Language::Ar => Language::En,
            Language::En => Language::Ar,
        }
    }

    /// Column suffix of bilingual fields, e.g. `name_ar`
    pub fn suffix(&self) -> &'static str {
        match self {
            Language::Ar => "_ar",
            Language::En => "_en",
        }
    }
}

impl FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ar" | "ar-sa" | "arabic" => Ok(Language::Ar),
            "en" | "en-us" | "en-gb" | "english" => Ok(Language::En),
            other => Err(format!("unsupported language: {}", other)),
        }
    }
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Rtl => "rtl",
            Direction::Ltr => "ltr",
        }
    }
}

/// Pick the text for `lang`, falling back to the other language when empty.
pub fn pick<'a>(lang: Language, ar: &'a str, en: &'a str) -> &'a str {
    let (wanted, fallback) = match lang {
        Language::Ar => (ar, en),
        Language::En => (en, ar),
    };
    if wanted.trim().is_empty() {
        fallback
    } else {
        wanted
    }
}

/// Same as [`pick`] for optional columns.
pub fn pick_opt<'a>(lang: Language, ar: &'a Option<String>, en: &'a Option<String>) -> &'a str {
    pick(
        lang,
        ar.as_deref().unwrap_or_default(),
        en.as_deref().unwrap_or_default(),
    )
}

/// Shared, switchable display language.
#[derive(Debug, Clone, Default)]
pub struct LanguageHandle(Arc<RwLock<Language>>);

impl LanguageHandle {
    pub fn new(lang: Language) -> Self {
        Self(Arc::new(RwLock::new(lang)))
    }

    pub fn get(&self) -> Language {
        *self.0.read().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn set(&self, lang: Language) {
        *self.0.write().unwrap_or_else(PoisonError::into_inner) = lang;
    }
}

/// Notification catalog
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Message {
    Created,
    Updated,
    Deleted,
    Saved,
    Uploaded,
    Published,
    Unpublished,
    StatusChanged,
    MessageSent,
    LoggedIn,
    LoggedOut,
    LoadFailed,
    SaveFailed,
    DeleteFailed,
    UploadFailed,
    NotFound,
    AccountNotFound,
    InvalidCredentials,
    Forbidden,
    Conflict,
    SessionExpired,
    StoreError,
}

impl Message {
    pub fn text(&self, lang: Language) -> &'static str {
        match lang {
            Language::Ar => self.arabic(),
            Language::En => self.english(),
        }
    }

    fn english(&self) -> &'static str {
        match self {
            Message::Created => "Created successfully",
            Message::Updated => "Updated successfully",
            Message::Deleted => "Deleted successfully",
            Message::Saved => "Changes saved",
            Message::Uploaded => "File uploaded",
            Message::Published => "Post published",
            Message::Unpublished => "Post moved to drafts",
            Message::StatusChanged => "Status updated",
            Message::MessageSent => "Your message has been sent. We will contact you soon",
            Message::LoggedIn => "Signed in successfully",
            Message::LoggedOut => "Signed out",
            Message::LoadFailed => "Failed to load data",
            Message::SaveFailed => "Failed to save changes",
            Message::DeleteFailed => "Failed to delete",
            Message::UploadFailed => "Failed to upload file",
            Message::NotFound => "The requested item was not found",
            Message::AccountNotFound => "No account exists with this email",
            Message::InvalidCredentials => "Incorrect password",
            Message::Forbidden => "You do not have permission to access the admin panel",
            Message::Conflict => "This item was changed by someone else. Reload and try again",
            Message::SessionExpired => "Your session has expired. Please sign in again",
            Message::StoreError => "Something went wrong. Please try again",
        }
    }

    fn arabic(&self) -> &'static str {
        match self {
            Message::Created => "تمت الإضافة بنجاح",
            Message::Updated => "تم التحديث بنجاح",
            Message::Deleted => "تم الحذف بنجاح",
            Message::Saved => "تم حفظ التغييرات",
            Message::Uploaded => "تم رفع الملف",
            Message::Published => "تم نشر المقال",
            Message::Unpublished => "تم نقل المقال إلى المسودات",
            Message::StatusChanged => "تم تحديث الحالة",
            Message::MessageSent => "تم إرسال رسالتك وسنتواصل معك قريباً",
            Message::LoggedIn => "تم تسجيل الدخول بنجاح",
            Message::LoggedOut => "تم تسجيل الخروج",
            Message::LoadFailed => "فشل تحميل البيانات",
            Message::SaveFailed => "فشل حفظ التغييرات",
            Message::DeleteFailed => "فشل الحذف",
            Message::UploadFailed => "فشل رفع الملف",
            Message::NotFound => "العنصر المطلوب غير موجود",
            Message::AccountNotFound => "لا يوجد حساب بهذا البريد الإلكتروني",
            Message::InvalidCredentials => "كلمة المرور غير صحيحة",
            Message::Forbidden => "ليس لديك صلاحية الوصول إلى لوحة التحكم",
            Message::Conflict => "تم تعديل هذا العنصر من قبل مستخدم آخر. أعد التحميل وحاول مجدداً",
            Message::SessionExpired => "انتهت صلاحية الجلسة. يرجى تسجيل الدخول مجدداً",
            Message::StoreError => "حدث خطأ ما. يرجى المحاولة مرة أخرى",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn direction_follows_language() {
        assert_eq!(Language::Ar.direction(), Direction::Rtl);
        assert_eq!(Language::En.direction().as_str(), "ltr");
    }

    #[test]
    fn pick_falls_back_when_empty() {
        assert_eq!(pick(Language::Ar, "خدمة", "Service"), "خدمة");
        assert_eq!(pick(Language::Ar, "  ", "Service"), "Service");
        assert_eq!(pick(Language::En, "خدمة", ""), "خدمة");
        assert_eq!(pick_opt(Language::En, &None, &Some("Hi".into())), "Hi");
    }

    #[test]
    fn parses_language_codes() {
        assert_eq!("AR".parse::<Language>().unwrap(), Language::Ar);
        assert_eq!("en-US".parse::<Language>().unwrap(), Language::En);
        assert!("fr".parse::<Language>().is_err());
    }

    #[test]
    fn handle_is_shared() {
        let handle = LanguageHandle::new(Language::Ar);
        let clone = handle.clone();
        clone.set(Language::En);
        assert_eq!(handle.get(), Language::En);
    }

    #[test]
    fn catalog_is_complete_in_both_languages() {
        for msg in [Message::Created, Message::Forbidden, Message::Conflict] {
            assert!(!msg.text(Language::Ar).is_empty());
            assert_ne!(msg.text(Language::Ar), msg.text(Language::En));
        }
    }
}
