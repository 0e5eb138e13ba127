use crate::domain::subscriber_language::SubscriberLanguage;

/// Transactional messages the dispatcher knows how to send.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemplateKind {
    ConfirmSubscription,
    VerifyAccount,
}

#[derive(Debug, Clone)]
pub struct TemplateParams {
    pub action_url: String,
    pub language: SubscriberLanguage,
}

impl TemplateKind {
    pub fn subject(&self, language: SubscriberLanguage) -> &'static str {
        match (self, language) {
            (Self::ConfirmSubscription, SubscriberLanguage::Catalan) => {
                "Confirma la teva subscripció - Sound Deluxe"
            }
            (Self::ConfirmSubscription, SubscriberLanguage::Spanish) => {
                "Confirma tu suscripción - Sound Deluxe"
            }
            (Self::ConfirmSubscription, SubscriberLanguage::English) => {
                "Confirm your subscription - Sound Deluxe"
            }
            (Self::VerifyAccount, SubscriberLanguage::Catalan) => {
                "Verifica el teu email - Sound Deluxe"
            }
            (Self::VerifyAccount, SubscriberLanguage::Spanish) => "Verifica tu email - Sound Deluxe",
            (Self::VerifyAccount, SubscriberLanguage::English) => {
                "Verify your email - Sound Deluxe"
            }
        }
    }

    fn call_to_action(&self, language: SubscriberLanguage) -> &'static str {
        match (self, language) {
            (Self::ConfirmSubscription, SubscriberLanguage::Catalan) => {
                "Fes clic per confirmar la teva subscripció al butlletí."
            }
            (Self::ConfirmSubscription, SubscriberLanguage::Spanish) => {
                "Haz clic para confirmar tu suscripción al boletín."
            }
            (Self::ConfirmSubscription, SubscriberLanguage::English) => {
                "Click to confirm your newsletter subscription."
            }
            (Self::VerifyAccount, SubscriberLanguage::Catalan) => {
                "Fes clic per verificar el teu email."
            }
            (Self::VerifyAccount, SubscriberLanguage::Spanish) => {
                "Haz clic para verificar tu email."
            }
            (Self::VerifyAccount, SubscriberLanguage::English) => "Click to verify your email.",
        }
    }

    pub fn render(&self, params: &TemplateParams) -> String {
        format!(
            r#"
            <div>
                <h1>Sound Deluxe</h1>
                <p><a href="{}">{}</a></p>
            </div>
            "#,
            params.action_url,
            self.call_to_action(params.language)
        )
    }
}
