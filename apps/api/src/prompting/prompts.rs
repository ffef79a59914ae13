// Prompt constants for candidate screening.

/// System prompt for every scoring call — evaluator persona, JSON-only output.
pub const SCREENING_SYSTEM: &str = "You are an ATS evaluator and Subject Matter Expert (SME) \
    for the given Job Description (JD). \
    You evaluate candidates based on their resume text against the JD. \
    You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences.";

/// Screening prompt template. Replace `{jd_text}` and `{resume_text}` before sending.
pub const SCREENING_PROMPT_TEMPLATE: &str = r#"<JD>
{jd_text}
</JD>
<RESUME>
{resume_text}
</RESUME>
Analyze the Job Description (JD) and Resume carefully. Follow these steps:
1. Understand the JD completely:
   - Extract the core business need (what the role helps the client achieve).
   - Identify required years of experience, technical requirements, soft skills, and domain.
   - Identify HARD FILTERS: explicit must-haves such as a required certification, degree,
     clearance or minimum years of experience.
2. Extract the candidate name from the resume if present.
3. Compare JD vs Resume:
   - Skill coverage: match resume skills against JD requirements.
   - Project relevance: check if projects align with the JD business need.
   - Role alignment: does the candidate's experience level fit the JD (lead vs junior)?
   - Education fit.
   Score each of these four from 0 to 100.
4. Identify penalties for major gaps and how many points each cost.
5. Compute a final score (0-100) considering all of the above.
6. Explain the score:
   - FIRST, state the required experience vs the candidate's experience
     (e.g. "Required 7+ years, candidate has 5 years - does not meet criteria").
   - Then explain which skills, projects or experience moved the score up or down.
7. List the most important reasons for the score, most important first, and quote short
   evidence snippets from the resume that support them.

Return a JSON object with this EXACT schema:
{
  "candidate_name": "Jane Doe",
  "final_score": 72,
  "hard_filter_pass": true,
  "explanation": "Required 5+ years, candidate has 6 years - meets criteria. ...",
  "skill_coverage": 75,
  "project_relevance": 80,
  "role_alignment": 70,
  "education_fit": 60,
  "penalties": [{"reason": "No Kubernetes experience", "points": 8}],
  "top_reasons": ["6 years of production Rust", "No Kubernetes experience"],
  "risks": ["Short tenure at last two employers"],
  "evidence_snippets": ["Built a Rust ingestion service handling 40k req/s"]
}

Rules:
- candidate_name is a string or null when the resume does not state a name.
- final_score is a number between 0 and 100.
- hard_filter_pass is a JSON boolean: false if ANY hard filter is not met.
- skill_coverage, project_relevance, role_alignment and education_fit are numbers 0-100 or null.
- penalties is an array of {"reason": string, "points": number}.
- top_reasons, risks and evidence_snippets are arrays of short strings; use [] when there are none."#;

/// Appended when the first answer could not be parsed.
pub const STRICT_SUFFIX: &str = "Return JSON with ALL required keys exactly as specified; \
    do not add or omit keys. If unsure, set numeric fields to 0 and arrays to []. \
    Ensure the explanation starts with the experience check (required vs actual) \
    and then the reasoning for the score.";

/// Marker appended to text cut by the truncator.
pub const TRUNCATION_MARKER: &str = "\n[...truncated]";
