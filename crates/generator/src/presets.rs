/// Curated prompt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Preset {
    pub key: &'static str,
    pub label: &'static str,
    pub text: &'static str,
}

pub const PRESETS: &[Preset] = &[
    Preset {
        key: "saas",
        label: "SaaS Product Launch",
        text: "Create a modern high-converting SaaS landing page for a project management tool called 'TaskFlow'. Sections: Hero with dashboard mockup, Features grid with icons, Social Proof with client logos, Pricing (Free, Pro, Enterprise), FAQ, and a clear CTA to Start Free Trial. Style: Clean, Minimalist, Blue and White palette.",
    },
    Preset {
        key: "mobile-app",
        label: "Mobile App Showcase",
        text: "Create a vibrant mobile app landing page for a fitness tracking application called 'FitTrack'. Sections: Hero with app screenshot, 'How it works' 3-step process, User Testimonials, and Download buttons for App Store and Play Store. Style: Dark mode, neon accents, energetic.",
    },
    Preset {
        key: "ebook",
        label: "E-Book / Lead Magnet",
        text: "Create a lead generation landing page for a free E-book titled 'The Ultimate Guide to AI Marketing'. Sections: Hero with book cover 3D mockup, 'What you'll learn' bullet points, Author bio, and a prominent Email Capture form. Style: Professional, trustworthy, serif fonts.",
    },
    Preset {
        key: "agency",
        label: "Agency Portfolio",
        text: "Create a creative portfolio landing page for a digital design agency. Sections: Hero with big bold typography, Selected Work grid (placeholders), Services list, Team section, and Contact form. Style: Artistic, bold, plenty of whitespace.",
    },
    Preset {
        key: "waitlist",
        label: "Waitlist Page",
        text: "Create a viral waitlist landing page for a stealth startup. Sections: Mysterious Hero with countdown timer placeholder, 'Why join?' value props, and a viral referral gamification explanation. Style: Futuristic, gradient background.",
    },
    Preset {
        key: "coffee-shop",
        label: "Coffee Shop Local Business",
        text: "Create a cozy, warm landing page for an artisanal coffee shop. Sections: Hero with cafe ambience image, Menu highlights, Location/Hours, and 'Order Online' CTA. Style: Earthy tones, browns and creams, inviting.",
    },
];

pub fn find_preset(key: &str) -> Option<&'static Preset> {
    PRESETS.iter().find(|p| p.key.eq_ignore_ascii_case(key))
}
