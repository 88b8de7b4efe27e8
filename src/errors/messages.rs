//! Localized display strings for [`ErrorKind`].

use super::ErrorKind;
use crate::types::language::LanguageTag;

/// Language prefixes with a translation table.
pub const SUPPORTED_MESSAGE_LANGUAGES: [&str; 4] = ["en", "es", "fr", "de"];

const MESSAGES: &[(ErrorKind, &str, &str)] = &[
    (ErrorKind::NetworkError, "en", "Unable to reach the service. Please check your connection and try again."),
    (ErrorKind::NetworkError, "es", "No se pudo conectar con el servicio. Revisa tu conexión e inténtalo de nuevo."),
    (ErrorKind::NetworkError, "fr", "Impossible de joindre le service. Vérifiez votre connexion et réessayez."),
    (ErrorKind::NetworkError, "de", "Der Dienst ist nicht erreichbar. Bitte Verbindung prüfen und erneut versuchen."),
    (ErrorKind::InvalidRequest, "en", "The request was invalid. Please check your input."),
    (ErrorKind::InvalidRequest, "es", "La solicitud no es válida. Revisa los datos introducidos."),
    (ErrorKind::InvalidRequest, "fr", "La requête est invalide. Veuillez vérifier votre saisie."),
    (ErrorKind::InvalidRequest, "de", "Die Anfrage ist ungültig. Bitte Eingabe überprüfen."),
    (ErrorKind::AuthError, "en", "Authentication failed. Please check the service credentials."),
    (ErrorKind::AuthError, "es", "Error de autenticación. Revisa las credenciales del servicio."),
    (ErrorKind::AuthError, "fr", "Échec de l'authentification. Vérifiez les identifiants du service."),
    (ErrorKind::AuthError, "de", "Authentifizierung fehlgeschlagen. Bitte Zugangsdaten prüfen."),
    (ErrorKind::ForbiddenError, "en", "Access to this resource is forbidden."),
    (ErrorKind::ForbiddenError, "es", "El acceso a este recurso está prohibido."),
    (ErrorKind::ForbiddenError, "fr", "L'accès à cette ressource est interdit."),
    (ErrorKind::ForbiddenError, "de", "Der Zugriff auf diese Ressource ist verboten."),
    (ErrorKind::NotFoundError, "en", "The requested resource was not found."),
    (ErrorKind::NotFoundError, "es", "No se encontró el recurso solicitado."),
    (ErrorKind::NotFoundError, "fr", "La ressource demandée est introuvable."),
    (ErrorKind::NotFoundError, "de", "Die angeforderte Ressource wurde nicht gefunden."),
    (ErrorKind::RateLimited, "en", "Too many requests. Please wait a moment and try again."),
    (ErrorKind::RateLimited, "es", "Demasiadas solicitudes. Espera un momento e inténtalo de nuevo."),
    (ErrorKind::RateLimited, "fr", "Trop de requêtes. Veuillez patienter un instant puis réessayer."),
    (ErrorKind::RateLimited, "de", "Zu viele Anfragen. Bitte kurz warten und erneut versuchen."),
    (ErrorKind::ServerError, "en", "The service is temporarily unavailable. Please try again later."),
    (ErrorKind::ServerError, "es", "El servicio no está disponible temporalmente. Inténtalo más tarde."),
    (ErrorKind::ServerError, "fr", "Le service est temporairement indisponible. Réessayez plus tard."),
    (ErrorKind::ServerError, "de", "Der Dienst ist vorübergehend nicht verfügbar. Bitte später erneut versuchen."),
    (ErrorKind::UnknownError, "en", "An unexpected error occurred."),
    (ErrorKind::UnknownError, "es", "Se produjo un error inesperado."),
    (ErrorKind::UnknownError, "fr", "Une erreur inattendue s'est produite."),
    (ErrorKind::UnknownError, "de", "Ein unerwarteter Fehler ist aufgetreten."),
];

const FALLBACK: &str = "An unexpected error occurred.";

fn lookup(kind: ErrorKind, prefix: &str) -> Option<&'static str> {
    MESSAGES
        .iter()
        .find(|(k, lang, _)| *k == kind && *lang == prefix)
        .map(|(_, _, message)| *message)
}

/// Display message for `kind` in `language`, falling back to English.
pub fn localized_message(kind: ErrorKind, language: &LanguageTag) -> &'static str {
    lookup(kind, &language.prefix())
        .or_else(|| lookup(kind, "en"))
        .unwrap_or(FALLBACK)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_kind_has_every_supported_language() {
        for kind in ErrorKind::ALL {
            for lang in SUPPORTED_MESSAGE_LANGUAGES {
                assert!(lookup(kind, lang).is_some(), "{kind} missing {lang}");
            }
        }
    }

    #[test]
    fn test_region_variant_uses_prefix() {
        let message = localized_message(ErrorKind::RateLimited, &LanguageTag::parse("es-MX"));
        assert_eq!(message, lookup(ErrorKind::RateLimited, "es").unwrap());
    }

    #[test]
    fn test_unsupported_language_falls_back_to_english_verbatim() {
        let message = localized_message(ErrorKind::AuthError, &LanguageTag::parse("ja-JP"));
        assert_eq!(
            message,
            "Authentication failed. Please check the service credentials."
        );
    }
}
