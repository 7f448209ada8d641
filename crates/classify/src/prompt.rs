//! Prompt templates for the remote categorization model.

/// Prompt for a single merchant. Asks for bare JSON so extraction stays
/// simple; the few-shot examples pin the output shape.
pub fn single(merchant: &str) -> String {
    format!(
        r#"Categorize the following merchant transaction.

**Merchant Name:** {merchant}

**Categories:**
- Dining: Restaurants, cafes, fast food, bars, coffee shops, food delivery
- Groceries: Supermarkets (excluding warehouse clubs like Costco)
- Gas: Gas stations, fuel
- Travel: Airlines, hotels, car rentals, Airbnb, travel agencies
- Other: Everything else

**Transaction Types:**
- purchase: Standard spending transaction
- transfer: Money movement (Zelle, Venmo, PayPal, bank transfers, ATM)
- income: Deposits, paychecks, refunds, reimbursements

**Instructions:**
1. Analyze the merchant name
2. Determine the most likely category
3. Identify the transaction type
4. Provide a confidence score (0.0 to 1.0)

**Output Format (JSON only, no markdown):**
{{
  "category": "Dining",
  "transactionType": "purchase",
  "confidence": 0.95
}}

**Examples:**

Merchant: STARBUCKS
-> {{ "category": "Dining", "transactionType": "purchase", "confidence": 0.99 }}

Merchant: WHOLE FOODS MARKET
-> {{ "category": "Groceries", "transactionType": "purchase", "confidence": 0.98 }}

Merchant: SHELL GAS STATION
-> {{ "category": "Gas", "transactionType": "purchase", "confidence": 0.99 }}

Merchant: ZELLE SENT
-> {{ "category": "Other", "transactionType": "transfer", "confidence": 1.0 }}

Now categorize: {merchant}"#
    )
}

const PROMPT_CATEGORIES: &str = "Dining, Groceries, Gas, Travel, Other";

/// Prompt for a numbered batch of merchants, answered as one JSON array in
/// the same order.
pub fn batch(merchants: &[String]) -> String {
    let listing: Vec<String> = merchants
        .iter()
        .enumerate()
        .map(|(i, m)| format!("{}. {m}", i + 1))
        .collect();
    let listing = listing.join("\n");
    let count = merchants.len();

    format!(
        r#"Categorize the following {count} merchants into spending categories.

For each merchant, provide:
- category: One of [{PROMPT_CATEGORIES}]
- transactionType: One of [purchase, transfer, income]
- confidence: Number between 0-1

Merchants:
{listing}

Return ONLY a JSON array with {count} objects in the same order, no other text:
[
  {{"category": "...", "transactionType": "...", "confidence": 0.9}},
  ...
]"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_names_the_merchant_twice() {
        let p = single("KROGER");
        assert_eq!(p.matches("KROGER").count(), 2);
        assert!(p.contains("JSON only"));
    }

    #[test]
    fn batch_numbers_merchants_in_order() {
        let p = batch(&["KROGER".to_string(), "SHELL".to_string()]);
        assert!(p.contains("1. KROGER"));
        assert!(p.contains("2. SHELL"));
        assert!(p.contains("2 merchants"));
        assert!(p.contains("JSON array with 2 objects"));
    }
}
