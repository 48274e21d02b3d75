//! SYSCOHADA starter chart of accounts and journals.

use super::types::{AccountType, NewAccount};
use crate::ledger::{JournalType, NewJournal};

/// Starter accounts: `(code, name, type)`.
pub const STARTER_ACCOUNTS: &[(&str, &str, AccountType)] = &[
    // Classe 1 : capitaux
    ("101", "Capital", AccountType::Equity),
    ("106", "Réserves", AccountType::Equity),
    ("12", "Résultat net", AccountType::Equity),
    // Classe 2 : immobilisations
    ("21", "Immobilisations incorporelles", AccountType::Asset),
    ("22", "Terrains", AccountType::Asset),
    ("23", "Bâtiments / constructions", AccountType::Asset),
    ("24", "Matériel & outillage", AccountType::Asset),
    ("28", "Amortissements", AccountType::Asset),
    // Classe 3 : stocks
    ("31", "Stocks de marchandises", AccountType::Asset),
    ("32", "Stocks de matières", AccountType::Asset),
    ("37", "Stocks - autres", AccountType::Asset),
    // Classe 4 : tiers
    ("401", "Fournisseurs", AccountType::Liability),
    ("404", "Fournisseurs d'immobilisations", AccountType::Liability),
    ("408", "Fournisseurs - factures non parvenues", AccountType::Liability),
    ("411", "Clients", AccountType::Asset),
    ("418", "Clients - produits à recevoir", AccountType::Asset),
    ("421", "Personnel - rémunérations dues", AccountType::Liability),
    ("431", "Sécurité sociale / CNPS", AccountType::Liability),
    ("4456", "TVA déductible", AccountType::Asset),
    ("4457", "TVA collectée", AccountType::Liability),
    ("447", "État - autres impôts & taxes", AccountType::Liability),
    // Classe 5 : trésorerie
    ("512", "Banques", AccountType::Asset),
    ("531", "Caisse", AccountType::Asset),
    ("57", "Caisse/banque - autres", AccountType::Asset),
    // Classe 6 : charges
    ("601", "Achats de marchandises", AccountType::Expense),
    ("602", "Achats de matières & fournitures", AccountType::Expense),
    ("604", "Achats d'études & prestations", AccountType::Expense),
    ("606", "Achats non stockés (eau, électricité, fournitures)", AccountType::Expense),
    ("611", "Transports", AccountType::Expense),
    ("612", "Voyages & déplacements", AccountType::Expense),
    ("613", "Locations", AccountType::Expense),
    ("614", "Charges locatives / copropriété", AccountType::Expense),
    ("615", "Entretien & réparations", AccountType::Expense),
    ("616", "Assurances", AccountType::Expense),
    ("617", "Services bancaires", AccountType::Expense),
    ("62", "Autres services extérieurs", AccountType::Expense),
    ("63", "Impôts & taxes", AccountType::Expense),
    ("64", "Charges de personnel", AccountType::Expense),
    ("65", "Autres charges", AccountType::Expense),
    // Classe 7 : produits
    ("701", "Ventes de marchandises", AccountType::Revenue),
    ("706", "Prestations de services", AccountType::Revenue),
    ("707", "Ventes - autres", AccountType::Revenue),
    ("75", "Autres produits", AccountType::Revenue),
];

/// Control accounts flagged reconcilable.
pub const RECONCILABLE_CODES: &[&str] = &["401", "411", "512", "531"];

/// Starter accounts as creation inputs.
#[must_use]
pub fn starter_accounts() -> Vec<NewAccount> {
    STARTER_ACCOUNTS
        .iter()
        .map(|(code, name, account_type)| {
            let account = NewAccount::new(*code, *name, *account_type);
            if RECONCILABLE_CODES.contains(code) {
                account.reconcilable()
            } else {
                account
            }
        })
        .collect()
}

/// Starter journals, including the year-end closing and opening journals.
#[must_use]
pub fn starter_journals(closing_code: &str, opening_code: &str) -> Vec<NewJournal> {
    vec![
        NewJournal::new("VT", "Journal des ventes", JournalType::Sales).with_defaults(Some("411"), Some("701")),
        NewJournal::new("AC", "Journal des achats", JournalType::Purchase).with_defaults(Some("601"), Some("401")),
        NewJournal::new("BQ", "Journal de banque", JournalType::Bank).with_defaults(Some("512"), None),
        NewJournal::new("CS", "Journal de caisse", JournalType::Cash).with_defaults(Some("531"), None),
        NewJournal::new("OD", "Opérations diverses", JournalType::General),
        NewJournal::new(closing_code, "Clôture de l'exercice", JournalType::General),
        NewJournal::new(opening_code, "À-nouveaux", JournalType::General),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_starter_codes_unique() {
        let codes: HashSet<_> = STARTER_ACCOUNTS.iter().map(|(code, _, _)| *code).collect();
        assert_eq!(codes.len(), STARTER_ACCOUNTS.len());
    }

    #[test]
    fn test_result_account_is_equity() {
        let result = STARTER_ACCOUNTS.iter().find(|(code, _, _)| *code == "12").unwrap();
        assert_eq!(result.2, AccountType::Equity);
    }

    #[test]
    fn test_control_accounts_reconcilable() {
        let accounts = starter_accounts();
        let reconcilable: Vec<_> = accounts
            .iter()
            .filter(|a| a.is_reconcilable)
            .map(|a| a.code.as_str())
            .collect();
        assert_eq!(reconcilable, vec!["401", "411", "512", "531"]);
    }

    #[test]
    fn test_starter_journals() {
        let journals = starter_journals("CLO", "AN");
        let codes: Vec<_> = journals.iter().map(|j| j.code.as_str()).collect();
        assert_eq!(codes, vec!["VT", "AC", "BQ", "CS", "OD", "CLO", "AN"]);
        assert_eq!(journals[0].default_debit_code.as_deref(), Some("411"));
        assert_eq!(journals[0].default_credit_code.as_deref(), Some("701"));
    }
}
