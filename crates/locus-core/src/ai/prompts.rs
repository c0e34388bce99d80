use crate::format::spoken_distance;
use crate::geo::Coordinate;
use crate::locale::Locale;

pub fn insight_system(locale: Locale) -> String {
    format!(
        "You are a helpful travel assistant. Always reply in {}.",
        locale.language_name()
    )
}

pub fn insight_prompt(at: Coordinate, locale: Locale) -> String {
    format!(
        "I am currently at latitude {}, longitude {}.\n\
         Briefly describe this general area in {}.\n\
         Focus on potential landmarks or interesting geographical features if known.\n\
         Limit to 2-3 sentences.",
        at.lat,
        at.lng,
        locale.language_name()
    )
}

pub fn chat_system(at: Coordinate, locale: Locale) -> String {
    format!(
        "You are Locus Assistant. The user is at coordinates {}, {}.\n\
         Help them find nearby places or explain coordinates.\n\
         Respond in {} only.",
        at.lat,
        at.lng,
        locale.language_name()
    )
}

pub fn voice_guidance_prompt(distance_km: f64) -> String {
    let dist = spoken_distance(distance_km);
    format!(
        "Act as a tracking assistant. The user's friend is {dist} away.\n\
         Generate a short voice guidance in BOTH English and Bengali.\n\
         Example: \"Target found. Your friend is {dist} away. Open navigation to reach them quickly. \
         টার্গেট পাওয়া গেছে। আপনার বন্ধু {dist} দূরে আছেন। দ্রুত পৌঁছাতে নেভিগেশন ব্যবহার করুন।\"\n\
         Keep it helpful and energetic."
    )
}
