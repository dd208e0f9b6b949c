// SPDX-License-Identifier: MIT OR Apache-2.0
//! First names handed out to generated users.

/// Pool of display names for [`crate::UserRegistry::new_user`].
pub const NAMES: &[&str] = &[
    "Noah", "James", "Evelyn", "Michael", "Asher", "Harper", "Luca", "Logan", "Dylan", "Avery",
    "Mason", "Julian", "Maverick", "Aiden", "Miles", "Grayson", "Carter", "Wyatt", "Riley",
    "Parker", "Aria", "Jayden", "Cameron", "Cooper", "Rowan", "Angel", "Kai", "Madison", "Zoe",
    "Nolan", "Adrian", "River", "Brooks", "Ryan", "Charlie", "Jordan", "Christian", "Theo",
    "Beau", "Walker", "Micah", "Eli", "Sawyer", "Genesis", "Paisley", "Landon", "Easton", "Gael",
    "Addison", "Quinn", "Hunter", "Emery", "Amari", "Carson", "Atlas", "Damian", "Claire",
    "Kinsley", "Kennedy", "Everly", "Emmett", "Hayden", "Emerson", "Ryder", "Zion", "Jade",
    "Brooklyn", "Archer", "Tatum", "Vivian", "Hailey", "Blake", "Aubrey", "Sage", "Oakley",
    "Skylar", "Evan", "Allison", "Elliott", "Legend", "Juan", "Remi", "Ashton", "Rory", "Rylee",
    "Peyton", "Chase", "Eva", "Jude", "Cole", "Eliza", "Elliot", "Hadley", "Alaia", "Finley",
    "Max", "Ashley", "Jayce", "Dakota", "Tyler", "Sutton", "Kaiden", "Camden", "Phoenix", "Reese",
    "Arya", "Bentley", "Maxwell", "Stetson", "Ryker", "Milan", "Beckett", "Ayden", "Tate",
    "Shiloh", "Remington", "Sloane", "Alex", "Karter", "Jesse", "Blakely", "Beckham", "Dallas",
    "Reagan", "Bailey", "Hayes", "Mackenzie", "Jett", "Barrett", "Morgan", "June", "Andrea",
    "Taylor", "Ariel", "Ari", "Presley", "Lennon", "Ellis", "Aspen", "Israel", "Kyrie", "Hallie",
    "Nico", "Armani", "Elian", "Haven", "Saylor", "Harlow", "Cohen", "Bryce", "Paxton", "Tristan",
    "Palmer", "Blair", "Kimberly", "Alexis", "Delaney", "Harmony", "Stevie", "Casey", "Jordyn",
    "Remy", "Marley", "Onyx", "Cade", "Ryleigh", "London", "Reign", "Holden", "Baylor", "Salem",
    "Camille", "Hendrix", "Londyn", "Elise", "Kendall", "Spencer", "Ali", "Teagan", "Emory",
    "Anderson", "Cody", "Aidan", "Payton", "Harley", "Rylan", "Leighton", "Brady", "Andre",
    "Cataleya", "Niko", "Callan", "Gideon", "Karson", "Brooke", "Colter", "Cristian", "Journey",
    "Selah", "Banks", "Evelynn", "Bradley", "Briar", "Jaden", "Kylian", "Kade", "Esme", "Mckenna",
    "Sunny", "Drew", "Amiri", "Lauren", "Jocelyn", "Raven", "Winter", "Sevyn", "Miller",
    "Kameron", "Paige", "Reece", "Noel", "Legacy", "Jay", "Kalani", "Skyler", "Bodie", "Murphy",
    "Koda", "Jamie", "Brooklynn", "Memphis", "Grady", "Kylo", "Oaklee", "Demi", "Kyle", "Rowen",
    "Kamryn", "Saige", "Raiden", "Frankie", "Francis", "Carmen", "Frances", "Devin", "Skye",
    "Zariah", "Reed", "Raegan", "Brynn", "Sean", "Royce", "Jalen", "Kayce", "Zayne", "Callen",
    "Mallory", "Mckenzie", "Monroe", "Cali", "Gunner", "Imani", "Camryn", "Corbin", "Chandler",
    "Layne", "Paris", "Miley", "Bellamy", "Robin", "Asa", "Cassidy", "Tru", "Alma", "Quincy",
    "Bo", "Alison", "Karsyn", "Lorelai", "Makenna", "Halo", "Andy", "Maddison", "Brinley",
    "McKinley", "Opal", "Jaiden", "Rio", "Faye", "Ivory", "Allie", "Amani", "Ayaan", "Meredith",
    "Blaire", "Kason", "Bristol", "Leland", "Kylan", "Royalty", "Kora", "Makenzie", "Averie",
    "Layton", "Deacon", "Scottie", "Dior", "Finnley", "Alia", "Jamari", "Santana", "Emerie",
    "Jaime", "Shane", "Kenzie", "Sasha", "Madden", "Kyla", "Lian", "Colby", "Cleo", "Ainsley",
    "Sloan", "Justice", "Kasen", "Shelby", "Charleigh", "Winnie", "Jessie", "Charley", "Leslie",
    "Dorian", "Scout", "Abby", "Augustine", "Scott", "Yael", "Harlan", "Sky", "Kyro", "Whitley",
    "Kelly", "Kelsey", "Marie", "Arden", "Fallon", "Sol", "Corey", "Henley", "Raylan", "Novah",
    "Jamison", "Adley", "True", "Aries", "Campbell", "Ira", "Khari", "Halle", "Haley", "Macy",
    "Joey", "Promise", "Sam", "Amos", "Rhodes", "Harlem", "Kyree", "Artemis", "Andi", "Trace",
    "Kacey", "Noor", "Lee", "Khai", "Chelsea", "Dani", "Amias", "Loyal", "Dillon", "Shea",
    "Alisson", "Rayne", "Zyair", "Dustin", "Angie", "Azael", "Hollis", "Dutton", "Seven", "Kori",
    "Lacey", "Marlowe", "Indy", "Landry", "Indigo", "Cheyenne", "Azaria", "Ray", "Elisha",
    "Jaycee", "Blaze", "Lea", "Flynn", "Kodi", "Rey", "Shay", "Chris", "Elia", "Shai", "Quentin",
    "Ever", "Ty", "Ashlyn", "Maddie", "Grey", "Belen", "Jrue", "Ripley", "Nori", "Blessing",
    "Bowie", "Landyn", "Rowyn", "Billie", "Kit", "Austyn", "Ellison", "Noe", "Gatlin", "Aden",
    "Kannon", "Brodie", "Ensley", "Ollie", "Waverly", "Andie", "Devon", "Baylee", "Kairi", "Zen",
    "Hadlee", "Harlee", "Keaton", "Jaylin", "Akira", "Rohan", "Keily", "Egypt", "Simone", "Eddie",
    "Zyon", "Sidney", "Marleigh", "Ren", "Dana", "Kylen", "Montana", "Jerry", "Kasey", "Bailee",
    "Ronnie", "Teo", "Whitney", "Guadalupe", "Kassidy", "Devyn", "Jericho", "Lux", "Hayley",
    "Darcy", "Kaya", "Eiden", "Kellen", "Sailor", "Rain", "Ryann", "Kartier", "Clare", "Perry",
    "Kellan", "Curtis", "Foster", "Toby", "Hadleigh", "Isa", "Aarya", "Eren", "Laken", "Averi",
    "Wrenleigh", "Moriah", "Laramie", "Carsyn", "Navi", "Randy", "Joyce", "Mattie", "Storm",
];
