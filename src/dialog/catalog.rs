//! Question catalog and supported languages.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::DialogError;

/// Identifier of the language-selection placeholder (answered by keypad, no text).
pub const LANGUAGE_QUESTION_ID: &str = "q0";

/// Identifier of the "do you like working alone or with others" question.
pub const WORK_STYLE_QUESTION_ID: &str = "q2";

/// Identifier of the terminal question in the built-in catalog.
pub const TERMINAL_QUESTION_ID: &str = "end";

/// Languages a caller can pick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    En,
    Hi,
    Gu,
}

impl Language {
    pub const ALL: [Language; 3] = [Language::En, Language::Hi, Language::Gu];

    /// Short language code (`en`, `hi`, `gu`).
    pub fn code(&self) -> &'static str {
        match self {
            Self::En => "en",
            Self::Hi => "hi",
            Self::Gu => "gu",
        }
    }

    /// Keypad menu: 1 English, 2 Hindi, 3 Gujarati.
    pub fn from_digits(digits: &str) -> Option<Self> {
        match digits.trim() {
            "1" => Some(Self::En),
            "2" => Some(Self::Hi),
            "3" => Some(Self::Gu),
            _ => None,
        }
    }

    /// Text-to-speech voice used for this language.
    pub fn voice(&self) -> &'static str {
        match self {
            Self::En => "Google.en-IN-Wavenet-D",
            Self::Hi => "Google.hi-IN-Wavenet-D",
            Self::Gu => "Google.gu-IN-Wavenet-D",
        }
    }

    /// Locale used for speech capture and rendering.
    pub fn locale(&self) -> &'static str {
        match self {
            Self::En => "en-IN",
            Self::Hi => "hi-IN",
            Self::Gu => "gu-IN",
        }
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// A single catalog entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Question {
    /// Stable identifier referenced by recorded answers.
    pub id: String,
    /// Spoken text per language. Empty for the language-selection placeholder.
    #[serde(default)]
    pub text: HashMap<Language, String>,
}

impl Question {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: HashMap::new(),
        }
    }

    pub fn with_text(mut self, language: Language, text: impl Into<String>) -> Self {
        self.text.insert(language, text.into());
        self
    }

    /// Text for `language`, or an error when the catalog entry lacks it.
    pub fn text_for(&self, language: Language) -> Result<&str, DialogError> {
        self.text
            .get(&language)
            .map(String::as_str)
            .ok_or_else(|| DialogError::MissingQuestionText {
                question_id: self.id.clone(),
                language: language.to_string(),
            })
    }
}

/// Ordered, immutable list of questions. The last entry is terminal; the
/// language placeholder is always first, so the list is never empty.
#[derive(Debug, Clone)]
pub struct QuestionCatalog {
    questions: Vec<Question>,
}

impl QuestionCatalog {
    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    /// Index of the terminal question.
    pub fn terminal_index(&self) -> usize {
        self.questions.len() - 1
    }

    /// Clamp an arbitrary (possibly negative or oversized) index into range.
    pub fn clamp_index(&self, index: i64) -> usize {
        index.clamp(0, self.terminal_index() as i64) as usize
    }

    /// Question at a clamped index; never panics.
    pub fn at(&self, index: usize) -> &Question {
        &self.questions[index.min(self.terminal_index())]
    }

    pub fn terminal(&self) -> &Question {
        self.at(self.terminal_index())
    }

    pub fn is_terminal_index(&self, index: usize) -> bool {
        index >= self.terminal_index()
    }

    pub fn position_of(&self, id: &str) -> Option<usize> {
        self.questions.iter().position(|q| q.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Question> {
        self.questions.iter()
    }

    /// The built-in career questionnaire.
    pub fn builtin() -> Self {
        let mut questions = vec![Question::new(LANGUAGE_QUESTION_ID)];
        for (id, en, hi, gu) in BUILTIN_QUESTIONS {
            questions.push(
                Question::new(*id)
                    .with_text(Language::En, *en)
                    .with_text(Language::Hi, *hi)
                    .with_text(Language::Gu, *gu),
            );
        }
        Self { questions }
    }
}

impl Default for QuestionCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

/// `(id, en, hi, gu)` for every question after the language placeholder.
const BUILTIN_QUESTIONS: &[(&str, &str, &str, &str)] = &[
    (
        "q1",
        "Hello. What is your name?",
        "नमस्ते। आपका नाम क्या है?",
        "નમસ્તે. તમારું નામ શું છે?",
    ),
    (
        "q2",
        "When you are given some work or homework, do you like doing it by yourself, or with friends or classmates?",
        "जब आपको कोई काम या होमवर्क दिया जाता है, क्या आपको अकेले करना पसंद है या दोस्तों या क्लासमेट्स के साथ करना अच्छा लगता है?",
        "જ્યારે તમને કોઈ કામ અથવા હોમવર્ક આપવામાં આવે છે, ત્યારે તમને એકલા કરવું ગમે છે કે મિત્રો અને ક્લાસમેટ્સ સાથે કરવું ગમે છે?",
    ),
    (
        "q3",
        "Do you enjoy talking or discussing different topics with others even if they don't agree with you?",
        "क्या आपको दूसरों से अलग-अलग विषयों पर बात करना या चर्चा करना अच्छा लगता है, भले ही वे आपसे सहमत न हों?",
        "શું તમને અન્ય લોકો સાથે અલગ વિષયો પર વાત કરવી કે ચર્ચા કરવી ગમે છે, ભલે તેઓ તમારી સાથે સહમત ન હોય?",
    ),
    (
        "q4",
        "If you started a small project or club with friends, what would it focus on?",
        "अगर आप अपने दोस्तों के साथ कोई छोटा प्रोजेक्ट या क्लब शुरू करें, तो वह किस विषय पर होगा?",
        "જો તમે મિત્રો સાથે કોઈ નાનું પ્રોજેક્ટ કે ક્લબ શરૂ કરો, તો તે કયા વિષય પર હશે?",
    ),
    (
        "q5",
        "When you get something new, like a phone or a tool, do you like finding out how it works, or just start using it?",
        "जब आपको कोई नई चीज़ मिलती है, जैसे मोबाइल या नया औज़ार, क्या आप जानना पसंद करते हैं कि यह कैसे चलता है, या बस इस्तेमाल करना शुरू कर देते हैं?",
        "જ્યારે તમને નવી વસ્તુ મળે, જેમ કે મોબાઈલ કે સાધન, તો શું તમે જાણવું ગમે છે કે તે કઈ રીતે કામ કરે છે કે સીધા વાપરવું શરૂ કરો છો?",
    ),
    (
        "q6",
        "Do you enjoy solving puzzles, math questions, or riddles that make you think hard? Which kind do you like most?",
        "क्या आपको पहेलियाँ, गणित के सवाल या ऐसी चीज़ें हल करना पसंद है जो दिमाग लगवाती हैं? किस तरह की पसंद है?",
        "શું તમને પઝલ્સ, ગણિતના પ્રશ્નો કે પહેલીઓ ઉકેલવી ગમે છે? કયો પ્રકાર ગમે છે?",
    ),
    (
        "q7",
        "Do you find it easy or confusing to understand maps, diagrams, or visual directions?",
        "क्या आपको नक्शे, चार्ट या चित्र देखकर समझना आसान लगता है या उलझन भरा?",
        "શું તમને નકશા, ચાર્ટ કે ચિત્ર જોઈને સમજવું સરળ લાગે છે કે કઠિન?",
    ),
    (
        "q8",
        "Which kind of work do you like more, creative like drawing and writing, or careful like measuring, calculating and planning?",
        "आपको किस तरह का काम ज़्यादा पसंद है, रचनात्मक जैसे ड्राइंग, लिखना या सावधानी वाला जैसे नापना, गणना?",
        "તમને કયું કામ વધુ ગમે છે, સર્જનાત્મક કે ધ્યાનપૂર્વકનું?",
    ),
    (
        "q9",
        "If your younger sibling didn't understand something in school, how would you explain it?",
        "अगर आपके छोटे भाई या बहन को कुछ समझ न आए, तो आप उसे कैसे बताएंगे?",
        "જો તમારા નાના ભાઈ કે બહેનને કંઈ સમજાતું ન હોય તો તમે કેવી રીતે સમજાવશો?",
    ),
    (
        "q10",
        "Would you rather build something with your hands, or come up with a new idea or plan for something?",
        "क्या आप अपने हाथों से कुछ बनाना पसंद करेंगे, या नया विचार या योजना बनाना?",
        "શું તમે હાથથી કંઈ બનાવવું ગમશે કે નવો વિચાર બનાવવો ગમશે?",
    ),
    (
        "q11",
        "What activities make you lose track of time because you enjoy them so much?",
        "कौन-सी गतिविधियाँ करते समय आपको समय का ध्यान नहीं रहता क्योंकि आपको वो बहुत पसंद हैं?",
        "કઈ પ્રવૃત્તિઓ કરતી વખતે તમને સમયનો ખ્યાલ નથી રહેતો?",
    ),
    (
        "q12",
        "Do you like being outdoors, playing and exploring, or indoors, reading and doing crafts?",
        "क्या आपको बाहर रहना पसंद है या अंदर रहकर ध्यान से काम करना?",
        "શું તમને બહાર રહેવું ગમે છે કે અંદર રહીને કામ કરવું ગમે છે?",
    ),
    (
        "q13",
        "Do you often help family or friends with fixing tools, using phones, arranging events, or solving small problems?",
        "क्या आप अक्सर परिवार या दोस्तों की मदद करते हैं जैसे चीजें ठीक करना, मोबाइल सिखाना या प्रोग्राम में मदद?",
        "શું તમે વારંવાર પરિવાર કે મિત્રોને મદદ કરો છો જેમ કે વસ્તુઓ ઠીક કરવી અથવા કામોમાં મદદ કરવી?",
    ),
    (
        "q14",
        "When you think about your future, what matters most: earning money, a steady job, or chances to learn and grow?",
        "जब आप अपने भविष्य के बारे में सोचते हैं, तो आपके लिए क्या सबसे ज़्यादा महत्वपूर्ण है: पैसा, स्थिरता या सीखना?",
        "તમારા માટે ભવિષ્યમાં કયો પરિબળ વધુ મહત્વનો છે? પૈસા, સ્થિરતા કે શીખવાના અવસર?",
    ),
    (
        "q15",
        "Would you prefer a safe permanent job, like in government, a school or a bank, or something uncertain like starting your own business?",
        "क्या आप सुरक्षित नौकरी पसंद करेंगे या कुछ नया और अनिश्चित, जैसे अपना व्यवसाय?",
        "શું તમે સુરક્ષિત નોકરી પસંદ કરશો કે અનિશ્ચિત વ્યવસાય શરૂ કરવો ગમશે?",
    ),
    (
        "q16",
        "How important is it that your work helps people, for example teaching, health, or farming?",
        "क्या आपके लिए यह ज़रूरी है कि आपका काम लोगों की मदद करे?",
        "તમારા માટે શું એવું કામ મહત્વનું છે જે લોકોની મદદ કરે?",
    ),
    (
        "q17",
        "When a project ends, what makes you happiest: praise, good results, or the whole team doing well together?",
        "जब कोई प्रोजेक्ट खत्म होता है, तो आपको क्या सबसे ज़्यादा खुशी देता है?",
        "પ્રોજેક્ટ પૂરો થાય ત્યારે તમને સૌથી વધુ કઈ બાબત ખુશ કરે છે?",
    ),
    (
        "q18",
        "In your dream future, would you like plenty of free time, busy active work, or a balanced life?",
        "भविष्य में आप बहुत फुर्सत चाहते हैं, व्यस्त काम या संतुलित जीवन?",
        "તમારા સ્વપ્નના ભવિષ્યમાં તમને ઘણો ફાજલ સમય, વ્યસ્ત કામ કે સંતુલિત જીવન જોઈએ?",
    ),
    (
        TERMINAL_QUESTION_ID,
        "Thanks. Preparing your recommendation.",
        "धन्यवाद। सिफारिश तैयार कर रहे हैं।",
        "આભાર. ભલામણ તૈયાર કરી રહ્યા છીએ.",
    ),
];
