use rand::Rng;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Quote {
    pub text: &'static str,
    pub author: &'static str,
}

impl std::fmt::Display for Quote {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "\"{}\"\n  -- {}", self.text, self.author)
    }
}

pub const QUOTES: [Quote; 15] = [
    Quote { text: "Peace comes from within. Do not seek it without.", author: "Buddha" },
    Quote { text: "The present moment is the only time over which we have dominion.", author: "Thích Nhất Hạnh" },
    Quote { text: "Meditation is not evasion; it is a serene encounter with reality.", author: "Thích Nhất Hạnh" },
    Quote { text: "Your calm mind is the ultimate weapon against your challenges.", author: "Bryant McGill" },
    Quote { text: "In the midst of movement and chaos, keep stillness inside of you.", author: "Deepak Chopra" },
    Quote { text: "Meditation is a way for nourishing and blossoming the divinity within you.", author: "Amit Ray" },
    Quote { text: "The goal of meditation isn't to control your thoughts, it's to stop letting them control you.", author: "Anonymous" },
    Quote { text: "Wherever you are, be there totally.", author: "Eckhart Tolle" },
    Quote { text: "Meditation brings wisdom; lack of meditation leaves ignorance.", author: "Buddha" },
    Quote { text: "The mind is everything. What you think you become.", author: "Buddha" },
    Quote { text: "Quiet the mind, and the soul will speak.", author: "Ma Jaya Sati Bhagavati" },
    Quote { text: "Meditation is the tongue of the soul and the language of our spirit.", author: "Jeremy Taylor" },
    Quote {
        text: "In meditation, healing can happen. When the mind is calm, alert and totally contented, then it is like a laser beam - it is very powerful and healing can happen.",
        author: "Amit Ray",
    },
    Quote {
        text: "Meditation is not about stopping thoughts, but recognizing that we are more than our thoughts and our feelings.",
        author: "Arianna Huffington",
    },
    Quote { text: "The thing about meditation is: You become more and more you.", author: "David Lynch" },
];

/// Picks quotes uniformly at random; repeats are allowed.
#[derive(Debug, Clone, Copy, Default)]
pub struct QuoteProvider;

impl QuoteProvider {
    pub fn all(&self) -> &'static [Quote] {
        &QUOTES
    }

    pub fn random<R: Rng>(&self, rng: &mut R) -> &'static Quote {
        &QUOTES[rng.gen_range(0..QUOTES.len())]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg64Mcg;

    #[test]
    fn random_quote_comes_from_the_list() {
        let mut rng = Pcg64Mcg::seed_from_u64(3);
        let provider = QuoteProvider;
        for _ in 0..50 {
            let quote = provider.random(&mut rng);
            assert!(provider.all().contains(quote));
        }
    }

    #[test]
    fn display_includes_author() {
        let text = QUOTES[7].to_string();
        assert!(text.contains("Wherever you are"));
        assert!(text.ends_with("Eckhart Tolle"));
    }
}
