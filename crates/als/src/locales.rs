//! Authored civic templates, one per supported country.
//!
//! Authoring rules: local working language, a government portal hostname
//! without a URL path, one civic phrase, formatting samples (postal code,
//! phone pattern, currency amount), optionally a generic weather-service
//! stub and a transit or agency acronym. Never the country name, a city
//! name that disambiguates on its own, brands, media outlets or anything
//! industry-adjacent.

use crate::Locale;

pub(crate) struct CivicTemplate {
    /// Standard-time offset from UTC, in minutes.
    pub utc_offset_minutes: i32,
    /// Label preceding the local timestamp, in the local language.
    pub time_label: &'static str,
    pub portal_host: &'static str,
    pub civic_phrase: &'static str,
    pub postal_sample: &'static str,
    pub phone_sample: &'static str,
    pub currency_sample: &'static str,
    pub weather_stub: Option<&'static str>,
    pub agency: &'static str,
}

pub(crate) fn civic_template(locale: Locale) -> &'static CivicTemplate {
    match locale {
        Locale::De => &CivicTemplate {
            utc_offset_minutes: 60,
            time_label: "Lokale Zeit:",
            portal_host: "bund.de",
            civic_phrase: "Termin beim Bürgeramt online vereinbaren",
            postal_sample: "10115",
            phone_sample: "+49 30 3901820",
            currency_sample: "24,90 €",
            weather_stub: Some("Amtliche Wetterwarnungen: keine"),
            agency: "ÖPNV-Auskunft",
        },
        Locale::Ch => &CivicTemplate {
            utc_offset_minutes: 60,
            time_label: "Lokale Zeit:",
            portal_host: "ch.ch",
            civic_phrase: "Termin online vereinbaren / prendre rendez-vous",
            postal_sample: "8001",
            phone_sample: "+41 44 631 31 11",
            currency_sample: "CHF 12.50",
            weather_stub: Some("Amtlicher Wetterdienst: keine Warnungen"),
            agency: "SBB CFF FFS",
        },
        Locale::Us => &CivicTemplate {
            utc_offset_minutes: -300,
            time_label: "Local time:",
            portal_host: "benefits.gov",
            civic_phrase: "Renew your driver's license at your local DMV office",
            postal_sample: "10001",
            phone_sample: "+1 (212) 555-0142",
            currency_sample: "$8.75",
            weather_stub: Some("National weather service: no active alerts"),
            agency: "DMV",
        },
        Locale::Gb => &CivicTemplate {
            utc_offset_minutes: 0,
            time_label: "Local time:",
            portal_host: "gov.uk",
            civic_phrase: "Book an appointment at your local council office",
            postal_sample: "M1 2AB",
            phone_sample: "+44 20 7946 0018",
            currency_sample: "£4.20",
            weather_stub: Some("Met service: no weather warnings in force"),
            agency: "HMRC",
        },
        Locale::Ae => &CivicTemplate {
            utc_offset_minutes: 240,
            time_label: "الوقت المحلي:",
            portal_host: "u.ae",
            civic_phrase: "جدد بطاقة الهوية عبر البوابة الرسمية",
            postal_sample: "ص.ب 12345",
            phone_sample: "+971 4 606 6666",
            currency_sample: "د.إ 25.00",
            weather_stub: None,
            agency: "RTA",
        },
        Locale::Sg => &CivicTemplate {
            utc_offset_minutes: 480,
            time_label: "Local time:",
            portal_host: "gov.sg",
            civic_phrase: "Book your NRIC re-registration appointment online",
            postal_sample: "238823",
            phone_sample: "+65 6123 4567",
            currency_sample: "S$5.80",
            weather_stub: None,
            agency: "MRT",
        },
        Locale::It => &CivicTemplate {
            utc_offset_minutes: 60,
            time_label: "Ora locale:",
            portal_host: "inps.it",
            civic_phrase: "Prenota un appuntamento all'anagrafe",
            postal_sample: "20121",
            phone_sample: "+39 02 1234 5678",
            currency_sample: "12,50 €",
            weather_stub: Some("Servizio meteo: nessuna allerta"),
            agency: "TPL",
        },
        Locale::Fr => &CivicTemplate {
            utc_offset_minutes: 60,
            time_label: "Heure locale :",
            portal_host: "service-public.fr",
            civic_phrase: "Prendre rendez-vous en mairie",
            postal_sample: "69003",
            phone_sample: "+33 1 53 45 67 89",
            currency_sample: "9,90 €",
            weather_stub: Some("Vigilance météo : aucune alerte en cours"),
            agency: "TER",
        },
    }
}
