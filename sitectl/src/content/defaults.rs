//! Content shown on the public site for sections nobody has configured yet.

use crate::db::models::content::{AboutContent, FooterContent, FooterLink, SocialMedia};
use uuid::Uuid;

pub fn about() -> AboutContent {
    AboutContent {
        id: Uuid::nil(),
        title: "About Our Digital Suite".to_string(),
        description: "We are a leading digital suite provider specializing in comprehensive business solutions."
            .to_string(),
        image_url: "https://images.unsplash.com/photo-1522071820081-009f0129c71c?ixlib=rb-4.0.3&auto=format&fit=crop&w=1470&q=80"
            .to_string(),
    }
}

pub fn footer() -> FooterContent {
    let link = |text: &str, url: &str| FooterLink {
        text: text.to_string(),
        url: url.to_string(),
    };
    FooterContent {
        id: Uuid::nil(),
        company_name: "Digital Suite Pro".to_string(),
        company_address: "123 Innovation Drive, Tech City, TC 12345".to_string(),
        links: vec![
            link("Privacy Policy", "#privacy"),
            link("Terms of Service", "#terms"),
            link("Support", "#support"),
        ],
        social_media: SocialMedia {
            instagram: Some("https://instagram.com".to_string()),
            facebook: Some("https://facebook.com".to_string()),
            whatsapp: Some("https://wa.me/1234567890".to_string()),
        },
    }
}
