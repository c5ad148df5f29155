//! Fixed question templates, in selection order. Reordering or inserting
//! entries changes which question past dates resolve to.

#[derive(Debug, Clone, Copy)]
pub struct Template {
    pub question: &'static str,
    pub answer: &'static str,
}

const fn template(question: &'static str, answer: &'static str) -> Template {
    Template { question, answer }
}

pub const EMOJI: &[Template] = &[
    template("🐍 + ☕ = ?", "Python"),
    template("🌍 + 🕸️ = ?", "World Wide Web"),
    template("📱 + 🍎 = ?", "iPhone"),
];

pub const CODE: &[Template] = &[
    template("What is output? console.log(2 + \"2\")", "22"),
    template("What is output? [1,2,3].length", "3"),
    template("What is typeof null?", "object"),
];

pub const LOGIC: &[Template] = &[
    template("A farmer has 17 sheep. All but 9 die. How many left?", "9"),
    template("If you drop a red stone in blue sea, what happens?", "It gets wet"),
];

pub const SCRAMBLE: &[Template] = &[
    template("Unscramble: TCAER", "REACT"),
    template("Unscramble: AVAJ", "JAVA"),
    template("Unscramble: TPIRCSAVAJ", "JAVASCRIPT"),
];

pub const PATTERN: &[Template] = &[
    template("3 → 9, 4 → 16, 5 → 25, 6 → ?", "36"),
    template("2, 4, 8, 16, ?", "32"),
];
